pub mod api_error;
pub mod handlers;
pub mod page;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_bytes();

    Router::new()
        .route("/", get(handlers::index))
        .route("/upload", post(handlers::upload))
        .route("/guide", post(handlers::load_guide))
        .route("/chat", post(handlers::chat))
        .route("/clear", post(handlers::clear))
        .route("/health", get(handlers::health))
        .route("/api/history", get(handlers::api_history))
        .route("/api/chat", post(handlers::api_chat))
        .layer(DefaultBodyLimit::max(upload_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
