use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pdf_assistant::{AssistantError, ErrorResponse};

/// JSON error body for the `/api` routes.
pub struct ApiError(pub AssistantError);

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AssistantError::EmptyQuestion | AssistantError::InvalidUpload(_) => {
                StatusCode::BAD_REQUEST
            }
            AssistantError::NoPdfLoaded => StatusCode::CONFLICT,
            AssistantError::MissingApiKey => StatusCode::SERVICE_UNAVAILABLE,
            AssistantError::Fetch(_)
            | AssistantError::FetchStatus { .. }
            | AssistantError::Gemini(_)
            | AssistantError::EmptyResponse => StatusCode::BAD_GATEWAY,
            AssistantError::PdfParse(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AssistantError::Config(_) | AssistantError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_user_error() {
            "warning"
        } else {
            "error"
        };

        let body = ErrorResponse {
            status: status.to_string(),
            error: self.0.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
