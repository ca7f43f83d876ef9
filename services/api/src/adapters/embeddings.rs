//! services/api/src/adapters/embeddings.rs
//!
//! Implements the `EmbeddingService` port with the OpenAI embeddings API.

use super::openai_client;
use async_openai::{error::OpenAIError, types::CreateEmbeddingRequestArgs};
use async_trait::async_trait;
use course_assistant_core::ports::{EmbeddingService, PortError, PortResult};

#[derive(Clone)]
pub struct OpenAiEmbeddingAdapter {
    http: reqwest::Client,
}

impl OpenAiEmbeddingAdapter {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl EmbeddingService for OpenAiEmbeddingAdapter {
    async fn embed(&self, api_key: &str, model: &str, input: &str) -> PortResult<Vec<f32>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(model)
            .input(input)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let response = openai_client(&self.http, api_key)
            .embeddings()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Provider(e.to_string()))?;

        response
            .data
            .into_iter()
            .next()
            .map(|embedding| embedding.embedding)
            .ok_or(PortError::EmptyResponse)
    }
}
