use pdf_assistant::{AssistantConfig, GeminiService, PdfLoader, SessionStore};

pub struct AppState {
    pub config: AssistantConfig,
    /// `None` when no API key is configured.
    pub gemini: Option<GeminiService>,
    pub loader: PdfLoader,
    pub sessions: SessionStore,
}

impl AppState {
    pub fn new(config: AssistantConfig) -> Self {
        let gemini = match GeminiService::new(&config) {
            Ok(service) => {
                log::info!("Using Gemini model {}", service.model());
                Some(service)
            }
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };

        Self::from_parts(config, gemini, PdfLoader::new())
    }

    pub fn from_parts(
        config: AssistantConfig,
        gemini: Option<GeminiService>,
        loader: PdfLoader,
    ) -> Self {
        let sessions = SessionStore::new(config.context_limit, config.session_ttl());
        Self {
            config,
            gemini,
            loader,
            sessions,
        }
    }
}
