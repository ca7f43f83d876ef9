pub mod anthropic_llm;
pub mod embeddings;
pub mod openai_llm;
pub mod tts;

pub use anthropic_llm::AnthropicMessagesAdapter;
pub use embeddings::OpenAiEmbeddingAdapter;
pub use openai_llm::OpenAiCompletionAdapter;
pub use tts::OpenAiTtsAdapter;

use async_openai::{config::OpenAIConfig, Client};

/// An OpenAI client for one call. Keys are resolved per call by the core,
/// so the client is rebuilt around the shared HTTP connection pool.
pub(crate) fn openai_client(http: &reqwest::Client, api_key: &str) -> Client<OpenAIConfig> {
    Client::with_config(OpenAIConfig::new().with_api_key(api_key)).with_http_client(http.clone())
}
