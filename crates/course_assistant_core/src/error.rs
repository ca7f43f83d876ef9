//! crates/course_assistant_core/src/error.rs
//!
//! The failure channel of every generator and session action.

use crate::ingestion::{ExtractionError, UploadError};
use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// No API key was passed explicitly and the provider's variable is unset.
    #[error("{provider} API key not found. Please set the {env_var} environment variable.")]
    MissingCredential {
        provider: &'static str,
        env_var: &'static str,
    },

    /// The remote call failed or returned nothing usable.
    #[error("Error while calling the {0}")]
    Provider(String),

    /// The reply was not the JSON object the prompt asked for.
    #[error("Could not parse the model reply: {0}")]
    Parse(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}

impl GenerationError {
    pub(crate) fn from_port(provider: &str, err: PortError) -> Self {
        GenerationError::Provider(format!("{} API: {}", provider, err))
    }
}

pub type GenerationResult<T> = Result<T, GenerationError>;
