use std::sync::OnceLock;
use tiktoken_rs::{cl100k_base, CoreBPE};
use tracing::warn;

/// Configuration for text chunking.
#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    /// Soft token budget per chunk. A single paragraph above it is kept whole.
    pub max_tokens: usize,
    /// Slice length used when no tokenizer is available.
    pub fallback_chunk_chars: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 8000,
            fallback_chunk_chars: 4000,
        }
    }
}

/// Splits `text` into paragraph-aligned chunks under the token budget, using
/// the GPT-4 tokenizer (cl100k_base). Falls back to fixed character slices
/// when the tokenizer cannot be loaded.
pub fn split_text_into_chunks(text: &str, config: &ChunkerConfig) -> Vec<String> {
    match tokenizer() {
        Ok(bpe) => chunk_by_paragraphs(text, config.max_tokens, |paragraph| {
            bpe.encode_with_special_tokens(paragraph).len()
        }),
        Err(e) => {
            warn!("Failed to load tokenizer, chunking by characters: {}", e);
            chunk_by_chars(text, config.fallback_chunk_chars)
        }
    }
}

/// The cl100k_base encoder, built on first use and shared afterwards.
fn tokenizer() -> Result<&'static CoreBPE, &'static str> {
    static BPE: OnceLock<Result<CoreBPE, String>> = OnceLock::new();
    BPE.get_or_init(|| cl100k_base().map_err(|e| e.to_string()))
        .as_ref()
        .map_err(String::as_str)
}

/// Accumulates newline-separated paragraphs into chunks whose token count stays
/// within `max_tokens`. Chunks are joined back with `\n`; no chunk is empty.
pub fn chunk_by_paragraphs<F>(text: &str, max_tokens: usize, count_tokens: F) -> Vec<String>
where
    F: Fn(&str) -> usize,
{
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_tokens = 0usize;

    for paragraph in text.split('\n') {
        let paragraph_tokens = count_tokens(paragraph);

        if current_tokens + paragraph_tokens > max_tokens {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            current = paragraph.to_string();
            current_tokens = paragraph_tokens;
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(paragraph);
            current_tokens += paragraph_tokens;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Fixed-size character slices covering the whole text with no gaps or overlaps.
pub fn chunk_by_chars(text: &str, chunk_chars: usize) -> Vec<String> {
    let chunk_chars = chunk_chars.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_chars)
        .map(|slice| slice.iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(s: &str) -> usize {
        s.split_whitespace().count()
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk_by_paragraphs("", 10, words).is_empty());
        assert!(chunk_by_chars("", 4000).is_empty());
    }

    #[test]
    fn paragraphs_are_packed_under_the_budget() {
        let text = "one two three\nfour five\nsix seven eight nine\nten";
        let chunks = chunk_by_paragraphs(text, 5, words);
        assert_eq!(chunks, vec!["one two three\nfour five", "six seven eight nine\nten"]);
        assert!(chunks.iter().all(|c| words(c) <= 5));
    }

    #[test]
    fn oversized_paragraph_is_emitted_whole() {
        let long = "a b c d e f g h";
        let text = format!("intro\n{}\noutro", long);
        let chunks = chunk_by_paragraphs(&text, 3, words);
        assert_eq!(chunks, vec!["intro", long, "outro"]);
    }

    #[test]
    fn joining_chunks_reproduces_the_text() {
        let text = "alpha beta\ngamma\ndelta epsilon zeta\neta\ntheta iota";
        let chunks = chunk_by_paragraphs(text, 4, words);
        assert!(chunks.iter().all(|c| !c.is_empty()));
        assert_eq!(chunks.join("\n"), text);
    }

    #[test]
    fn char_fallback_covers_the_input_without_overlap() {
        let text = "é".repeat(9001);
        let chunks = chunk_by_chars(&text, 4000);
        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4000));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn tokenizer_chunking_keeps_short_text_in_one_chunk() {
        let text = "Descriptive statistics summarise data.\nThe mean is one measure.";
        let chunks = split_text_into_chunks(text, &ChunkerConfig::default());
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn tokenizer_is_built_once() {
        let first = tokenizer().unwrap();
        let second = tokenizer().unwrap();
        assert!(std::ptr::eq(first, second));
    }
}
