use anyhow::Context;
use api::{app, AppState};
use pdf_assistant::AssistantConfig;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize environment variables and logging
    dotenv::dotenv().ok();
    env_logger::init();

    let config = AssistantConfig::load().context("failed to load configuration")?;
    let bind_addr = config.bind_addr.clone();

    let state = Arc::new(AppState::new(config));
    if state.gemini.is_none() {
        log::warn!("No Gemini API key configured; chat is disabled until one is provided");
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    log::info!("PDF assistant listening on {}", listener.local_addr()?);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
