pub mod config;
pub mod error;
pub mod gemini_service;
pub mod models;
pub mod pdf_loader;
pub mod prompt;
pub mod session;
pub mod session_store;

pub use config::AssistantConfig;
pub use error::{AssistantError, Result};
pub use gemini_service::{ChatThread, GeminiService};
pub use models::*;
pub use pdf_loader::PdfLoader;
pub use session::ChatSession;
pub use session_store::{SessionHandle, SessionStore};
