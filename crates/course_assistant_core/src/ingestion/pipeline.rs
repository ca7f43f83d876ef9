use super::chunker::{split_text_into_chunks, ChunkerConfig};
use super::embedder::Embedder;
use super::extract::{extract_text, DocumentKind, ExtractionError};
use tracing::info;

/// The full text of an uploaded document and one embedding per chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedDocument {
    pub text: String,
    pub embeddings: Vec<Vec<f32>>,
}

/// Extraction, chunking and embedding composed into one step.
#[derive(Clone)]
pub struct DocumentPipeline {
    embedder: Embedder,
    chunker: ChunkerConfig,
}

impl DocumentPipeline {
    pub fn new(embedder: Embedder, chunker: ChunkerConfig) -> Self {
        Self { embedder, chunker }
    }

    /// Dispatches on the file name's extension. An unrecognised extension fails
    /// without touching the extractor or the embedding service.
    pub async fn process(
        &self,
        api_key: &str,
        bytes: &[u8],
        file_name: &str,
    ) -> Result<ProcessedDocument, ExtractionError> {
        let kind = DocumentKind::from_file_name(file_name)
            .ok_or_else(|| ExtractionError::UnsupportedFileType(super::extension_of(file_name)))?;

        let text = extract_text(kind, bytes)?;
        let chunks = split_text_into_chunks(&text, &self.chunker);
        let embeddings = self.embedder.embed_chunks(api_key, &chunks).await;

        info!(
            file = file_name,
            chars = text.len(),
            chunks = chunks.len(),
            "Processed document"
        );
        Ok(ProcessedDocument { text, embeddings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingestion::EMBEDDING_DIMENSION;
    use crate::ports::MockEmbeddingService;
    use std::sync::Arc;

    fn pipeline(mock: MockEmbeddingService) -> DocumentPipeline {
        DocumentPipeline::new(
            Embedder::new(Arc::new(mock), "text-embedding-3-small"),
            ChunkerConfig::default(),
        )
    }

    #[tokio::test]
    async fn text_file_is_extracted_and_embedded() {
        let mut mock = MockEmbeddingService::new();
        mock.expect_embed()
            .times(1)
            .returning(|_, _, _| Ok(vec![0.5; EMBEDDING_DIMENSION]));

        let doc = pipeline(mock)
            .process("sk-test", b"Mean\nMedian\nMode", "notes.TXT")
            .await
            .unwrap();

        assert_eq!(doc.text, "Mean\nMedian\nMode");
        assert_eq!(doc.embeddings.len(), 1);
    }

    #[tokio::test]
    async fn unknown_extension_short_circuits() {
        let mut mock = MockEmbeddingService::new();
        mock.expect_embed().times(0);

        let err = pipeline(mock)
            .process("sk-test", b"a,b,c", "table.csv")
            .await
            .unwrap_err();

        assert!(matches!(err, ExtractionError::UnsupportedFileType(ext) if ext == ".csv"));
    }
}
