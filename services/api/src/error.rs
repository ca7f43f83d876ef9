//! services/api/src/error.rs
//!
//! Defines the startup error type of the API service and the HTTP error
//! returned by request handlers.

use crate::config::ConfigError;
use crate::web::protocol::ErrorResponse;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use course_assistant_core::ingestion::UploadError;
use course_assistant_core::GenerationError;
use tracing::{error, warn};

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

//=========================================================================================
// HTTP Errors
//=========================================================================================

/// An error answered to the client as `{"error": message}`.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

/// Status code for each failure of a session action.
pub fn status_for(err: &GenerationError) -> StatusCode {
    match err {
        GenerationError::MissingCredential { .. } => StatusCode::SERVICE_UNAVAILABLE,
        GenerationError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        GenerationError::NotFound(_) => StatusCode::NOT_FOUND,
        GenerationError::Provider(_) | GenerationError::Parse(_) => StatusCode::BAD_GATEWAY,
        GenerationError::Upload(UploadError::UnsupportedExtension(_)) => StatusCode::BAD_REQUEST,
        GenerationError::Upload(UploadError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        GenerationError::Extraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
    }
}

impl From<GenerationError> for HttpError {
    fn from(err: GenerationError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            error!("Session action failed: {}", err);
        } else {
            warn!("Session action rejected: {}", err);
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_errors_map_to_statuses() {
        let missing = GenerationError::MissingCredential {
            provider: "OpenAI",
            env_var: "OPENAI_API_KEY",
        };
        assert_eq!(status_for(&missing), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            status_for(&GenerationError::InvalidInput("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_for(&GenerationError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_for(&GenerationError::Parse("x".into())), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_for(&GenerationError::Upload(UploadError::TooLarge {
                name: "a.pdf".into(),
                limit_mib: 10
            })),
            StatusCode::PAYLOAD_TOO_LARGE
        );
    }

    #[test]
    fn http_error_keeps_the_message() {
        let err = HttpError::from(GenerationError::Provider("OpenAI API: timeout".into()));
        assert_eq!(err.status, StatusCode::BAD_GATEWAY);
        assert_eq!(err.message, "Error while calling the OpenAI API: timeout");
    }
}
