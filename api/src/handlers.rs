use crate::api_error::ApiError;
use crate::page::IndexPage;
use crate::state::AppState;
use askama::Template;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use pdf_assistant::{
    AssistantError, ChatReply, ChatRequest, HistoryResponse, LoadedPdf, Notice, SessionHandle,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "pdf_assistant_session";

#[derive(Deserialize)]
pub struct ChatForm {
    #[serde(default)]
    pub message: String,
}

async fn session_for(state: &AppState, jar: CookieJar) -> (CookieJar, SessionHandle) {
    let known = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok());
    let (id, session) = state.sessions.get_or_create(known).await;

    if known == Some(id) {
        return (jar, session);
    }

    let cookie = Cookie::build((SESSION_COOKIE, id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), session)
}

pub async fn index(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let (jar, session) = session_for(&state, jar).await;
    let mut session = session.lock().await;
    let notice = session.take_notice();

    let mut page = IndexPage::new(session.history());
    page.notice = notice;
    page.pdf_source = session.pdf().map(|pdf| pdf.source.describe());
    page.guide_enabled = state.config.guide_url.is_some();
    if state.gemini.is_none() {
        page.config_error = Some(AssistantError::MissingApiKey.to_string());
        page.chat_enabled = false;
    }

    match page.render() {
        Ok(html) => (jar, Html(html)).into_response(),
        Err(e) => {
            log::error!("Failed to render page: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render page").into_response()
        }
    }
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    multipart: Multipart,
) -> (CookieJar, Redirect) {
    let (jar, session) = session_for(&state, jar).await;

    let notice = match read_upload(&state, multipart).await {
        Ok(pdf) => {
            session.lock().await.set_pdf(pdf);
            Notice::success("PDF loaded successfully!")
        }
        Err(e) if e.is_user_error() => {
            log::warn!("Rejected upload: {}", e);
            Notice::warning(e.to_string())
        }
        Err(e) => {
            log::error!("Upload failed: {}", e);
            Notice::error(format!("Error loading PDF: {e}"))
        }
    };

    session.lock().await.set_notice(notice);
    (jar, Redirect::to("/"))
}

async fn read_upload(state: &AppState, mut multipart: Multipart) -> Result<LoadedPdf, AssistantError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AssistantError::InvalidUpload(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        let content_type = field.content_type().unwrap_or_default().to_string();
        if !is_pdf_upload(&filename, &content_type) {
            return Err(AssistantError::InvalidUpload(format!(
                "{} is not a PDF file",
                if filename.is_empty() { "upload" } else { filename.as_str() }
            )));
        }

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AssistantError::InvalidUpload(e.body_text()))?;
        if bytes.is_empty() {
            return Err(AssistantError::InvalidUpload("the uploaded file is empty".into()));
        }

        return state.loader.load_from_bytes(bytes.to_vec(), &filename).await;
    }

    Err(AssistantError::InvalidUpload("no file was uploaded".into()))
}

fn is_pdf_upload(filename: &str, content_type: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf") || content_type == "application/pdf"
}

pub async fn load_guide(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    let (jar, session) = session_for(&state, jar).await;

    let notice = match &state.config.guide_url {
        None => Notice::warning("No guide URL is configured."),
        Some(url) => match state.loader.load_from_url(url).await {
            Ok(pdf) => {
                session.lock().await.set_pdf(pdf);
                Notice::success("Prompting guide loaded successfully!")
            }
            Err(e) => {
                log::error!("Guide load failed: {}", e);
                Notice::error(format!("Error loading PDF: {e}"))
            }
        },
    };

    session.lock().await.set_notice(notice);
    (jar, Redirect::to("/"))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<ChatForm>,
) -> (CookieJar, Redirect) {
    let (jar, session) = session_for(&state, jar).await;
    let mut session = session.lock().await;

    let outcome = match &state.gemini {
        Some(gemini) => session.ask(gemini, &form.message).await.map(|_| ()),
        None => Err(AssistantError::MissingApiKey),
    };

    match outcome {
        Ok(()) => {}
        Err(AssistantError::EmptyQuestion) => {}
        Err(e) if e.is_user_error() => session.set_notice(Notice::warning(e.to_string())),
        Err(AssistantError::MissingApiKey) => {
            session.set_notice(Notice::error(AssistantError::MissingApiKey.to_string()))
        }
        Err(e) => {
            log::error!("Chat turn failed: {}", e);
            session.set_notice(Notice::error(format!("An error occurred: {e}")));
        }
    }

    (jar, Redirect::to("/"))
}

pub async fn clear(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    let (jar, session) = session_for(&state, jar).await;
    session.lock().await.clear(state.gemini.as_ref());
    (jar, Redirect::to("/"))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "sessions": state.sessions.len().await,
        "api_key_configured": state.gemini.is_some(),
    }))
}

pub async fn api_history(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> (CookieJar, Json<HistoryResponse>) {
    let (jar, session) = session_for(&state, jar).await;
    let session = session.lock().await;

    let body = HistoryResponse {
        pdf_loaded: session.has_pdf(),
        pdf_source: session.pdf().map(|pdf| pdf.source.clone()),
        history: session.history().to_vec(),
    };
    (jar, Json(body))
}

pub async fn api_chat(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(request): Json<ChatRequest>,
) -> (CookieJar, Result<Json<ChatReply>, ApiError>) {
    let (jar, session) = session_for(&state, jar).await;
    let mut session = session.lock().await;

    let result = async {
        let gemini = state.gemini.as_ref().ok_or(AssistantError::MissingApiKey)?;
        let reply = session.ask(gemini, &request.message).await?.content.clone();
        Ok::<_, AssistantError>(Json(ChatReply {
            reply,
            history: session.history().to_vec(),
        }))
    }
    .await
    .map_err(ApiError::from);

    if let Err(ApiError(e)) = &result {
        log::warn!("API chat request failed: {}", e);
    }

    (jar, result)
}
