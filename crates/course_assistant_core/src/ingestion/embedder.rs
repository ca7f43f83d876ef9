use crate::ports::EmbeddingService;
use std::sync::Arc;
use tracing::{info, warn};

/// Dimension of `text-embedding-3-small` vectors.
pub const EMBEDDING_DIMENSION: usize = 1536;

/// Embeds chunks one by one. A failed chunk is replaced by a zero vector so
/// the output always lines up with the input.
#[derive(Clone)]
pub struct Embedder {
    service: Arc<dyn EmbeddingService>,
    model: String,
}

impl Embedder {
    pub fn new(service: Arc<dyn EmbeddingService>, model: impl Into<String>) -> Self {
        Self { service, model: model.into() }
    }

    pub async fn embed_chunks(&self, api_key: &str, chunks: &[String]) -> Vec<Vec<f32>> {
        let mut embeddings = Vec::with_capacity(chunks.len());
        for (i, chunk) in chunks.iter().enumerate() {
            match self.service.embed(api_key, &self.model, chunk).await {
                Ok(vector) => embeddings.push(vector),
                Err(e) => {
                    warn!("Embedding failed for chunk {}: {}", i, e);
                    embeddings.push(vec![0.0; EMBEDDING_DIMENSION]);
                }
            }
        }
        info!("Embedded {} chunks with {}", embeddings.len(), self.model);
        embeddings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockEmbeddingService, PortError};

    #[tokio::test]
    async fn failed_chunk_becomes_zero_vector() {
        let mut mock = MockEmbeddingService::new();
        mock.expect_embed().times(3).returning(|_, model, input| {
            assert_eq!(model, "text-embedding-3-small");
            if input == "bad" {
                Err(PortError::Provider("rate limited".into()))
            } else {
                Ok(vec![1.0; EMBEDDING_DIMENSION])
            }
        });

        let embedder = Embedder::new(Arc::new(mock), "text-embedding-3-small");
        let chunks = vec!["good".to_string(), "bad".to_string(), "fine".to_string()];
        let out = embedder.embed_chunks("sk-test", &chunks).await;

        assert_eq!(out.len(), 3);
        assert!(out.iter().all(|v| v.len() == EMBEDDING_DIMENSION));
        assert!(out[1].iter().all(|x| *x == 0.0));
        assert!(out[0].iter().all(|x| *x == 1.0));
    }

    #[tokio::test]
    async fn no_chunks_means_no_calls() {
        let mut mock = MockEmbeddingService::new();
        mock.expect_embed().times(0);
        let embedder = Embedder::new(Arc::new(mock), "text-embedding-3-small");
        assert!(embedder.embed_chunks("sk-test", &[]).await.is_empty());
    }
}
