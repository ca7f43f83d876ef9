//! Document ingestion: upload validation, text extraction, chunking and
//! embedding of reference documents.

pub mod chunker;
pub mod embedder;
pub mod extract;
pub mod pipeline;

pub use chunker::{split_text_into_chunks, ChunkerConfig};
pub use embedder::{Embedder, EMBEDDING_DIMENSION};
pub use extract::{extract_text, DocumentKind, ExtractionError};
pub use pipeline::{DocumentPipeline, ProcessedDocument};

/// Uploads rejected before they enter the pipeline.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported file type: {0}. Only PDF, DOCX, PPTX and TXT files are accepted.")]
    UnsupportedExtension(String),
    #[error("The file {name} exceeds the maximum size of {limit_mib} MB.")]
    TooLarge { name: String, limit_mib: usize },
}

/// Acceptance rules for uploaded documents.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self { max_bytes: 10 * 1024 * 1024 }
    }
}

impl UploadLimits {
    /// Checks extension and size, returning the detected document kind.
    pub fn validate(&self, name: &str, size: usize) -> Result<DocumentKind, UploadError> {
        let kind = DocumentKind::from_file_name(name)
            .ok_or_else(|| UploadError::UnsupportedExtension(extension_of(name)))?;
        if size > self.max_bytes {
            return Err(UploadError::TooLarge {
                name: name.to_string(),
                limit_mib: self.max_bytes / (1024 * 1024),
            });
        }
        Ok(kind)
    }
}

/// Lower-cased extension of `name` including the dot, or an empty string.
pub fn extension_of(name: &str) -> String {
    std::path::Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_extensions_case_insensitively() {
        let limits = UploadLimits::default();
        assert_eq!(limits.validate("Notes.PDF", 10).unwrap(), DocumentKind::Pdf);
        assert_eq!(limits.validate("a.txt", 0).unwrap(), DocumentKind::Txt);
    }

    #[test]
    fn rejects_unknown_extension_and_oversized_files() {
        let limits = UploadLimits::default();
        assert!(matches!(
            limits.validate("sheet.xlsx", 10),
            Err(UploadError::UnsupportedExtension(ext)) if ext == ".xlsx"
        ));
        assert!(matches!(
            limits.validate("big.pdf", 10 * 1024 * 1024 + 1),
            Err(UploadError::TooLarge { limit_mib: 10, .. })
        ));
        assert!(limits.validate("exact.pdf", 10 * 1024 * 1024).is_ok());
    }
}
