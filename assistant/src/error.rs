use thiserror::Error;

pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("Error loading API key. Please check your configuration.")]
    MissingApiKey,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to fetch PDF: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("failed to fetch PDF from {url}: HTTP {status}")]
    FetchStatus { url: String, status: u16 },

    #[error("failed to extract text from PDF: {0}")]
    PdfParse(String),

    #[error("Gemini API error: {0}")]
    Gemini(String),

    #[error("the model returned no text")]
    EmptyResponse,

    #[error("Please load a PDF first!")]
    NoPdfLoaded,

    #[error("message is empty")]
    EmptyQuestion,

    #[error("invalid upload: {0}")]
    InvalidUpload(String),
}

impl AssistantError {
    /// Errors the user can fix from the page itself; rendered as warnings
    /// rather than failures.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            AssistantError::NoPdfLoaded
                | AssistantError::EmptyQuestion
                | AssistantError::InvalidUpload(_)
        )
    }
}
