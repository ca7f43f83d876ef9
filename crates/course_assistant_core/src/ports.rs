//! crates/course_assistant_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the remote providers the core
//! depends on. Concrete HTTP implementations live in the `api` service, which
//! keeps the generation logic independent of any particular SDK.
//!
//! Every port receives the already-resolved API key with each call; credential
//! lookup happens in the core before a port is ever touched.

use crate::domain::Voice;
use async_trait::async_trait;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Missing API key: {0}")]
    MissingCredential(String),
    #[error("Provider error: {0}")]
    Provider(String),
    #[error("The provider returned an empty response")]
    EmptyResponse,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: ChatRole::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: ChatRole::User, content: content.into() }
    }
}

/// A single text-completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider to force a single JSON object as the reply.
    pub json_object: bool,
}

/// A single speech-synthesis request.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub model: String,
    pub voice: Voice,
    pub input: String,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Runs one completion and returns the reply text.
    async fn complete(&self, api_key: &str, request: CompletionRequest) -> PortResult<String>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Embeds a single text input into one fixed-dimension vector.
    async fn embed(&self, api_key: &str, model: &str, input: &str) -> PortResult<Vec<f32>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextToSpeechService: Send + Sync {
    /// Generates raw audio bytes (MP3) from a string of text.
    async fn generate_audio(&self, api_key: &str, request: SpeechRequest) -> PortResult<Vec<u8>>;
}
