//! crates/course_assistant_core/src/audio.rs
//!
//! Podcast speech synthesis. Input is truncated to the provider's cap; there
//! is no chunk-and-concatenate for longer scripts.

use crate::domain::{PodcastAudio, TextProvider, Voice};
use crate::error::{GenerationError, GenerationResult};
use crate::ports::{SpeechRequest, TextToSpeechService};
use base64::Engine;
use std::sync::Arc;
use tracing::{info, warn};

/// Maximum input length accepted by the speech endpoint, in characters.
pub const MAX_SPEECH_INPUT_CHARS: usize = 4096;

/// Bytes per second used for the duration estimate.
const ESTIMATED_BYTES_PER_SECOND: f64 = 16000.0;

/// Returns the first `MAX_SPEECH_INPUT_CHARS` characters of `text`.
pub fn truncate_for_speech(text: &str) -> &str {
    match text.char_indices().nth(MAX_SPEECH_INPUT_CHARS) {
        Some((cut, _)) => &text[..cut],
        None => text,
    }
}

#[derive(Clone)]
pub struct AudioSynthesizer {
    speech: Arc<dyn TextToSpeechService>,
    model: String,
}

impl AudioSynthesizer {
    pub fn new(speech: Arc<dyn TextToSpeechService>, model: impl Into<String>) -> Self {
        Self { speech, model: model.into() }
    }

    pub async fn synthesize(
        &self,
        api_key: &str,
        text: &str,
        voice: Voice,
    ) -> GenerationResult<PodcastAudio> {
        let input = truncate_for_speech(text);
        if input.len() < text.len() {
            warn!(
                "Script of {} characters truncated to {} for speech synthesis",
                text.chars().count(),
                MAX_SPEECH_INPUT_CHARS
            );
        }

        let request = SpeechRequest {
            model: self.model.clone(),
            voice,
            input: input.to_string(),
        };
        let bytes = self
            .speech
            .generate_audio(api_key, request)
            .await
            .map_err(|e| GenerationError::from_port(TextProvider::OpenAi.vendor_name(), e))?;

        if bytes.is_empty() {
            return Err(GenerationError::Provider(
                "OpenAI API: the speech endpoint returned no audio".to_string(),
            ));
        }

        info!("Synthesized {} bytes of audio with voice {}", bytes.len(), voice);
        Ok(PodcastAudio {
            duration_seconds: bytes.len() as f64 / ESTIMATED_BYTES_PER_SECOND,
            audio_base64: base64::engine::general_purpose::STANDARD.encode(&bytes),
            format: "mp3".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockTextToSpeechService, PortError};

    #[test]
    fn short_text_is_not_truncated() {
        let text = "a".repeat(MAX_SPEECH_INPUT_CHARS);
        assert_eq!(truncate_for_speech(&text), text);
    }

    #[test]
    fn long_text_keeps_exactly_the_first_chars() {
        let text = format!("{}{}", "ü".repeat(MAX_SPEECH_INPUT_CHARS), "tail");
        let cut = truncate_for_speech(&text);
        assert_eq!(cut.chars().count(), MAX_SPEECH_INPUT_CHARS);
        assert!(!cut.contains("tail"));
    }

    #[tokio::test]
    async fn submits_truncated_text_and_encodes_reply() {
        let mut mock = MockTextToSpeechService::new();
        mock.expect_generate_audio()
            .times(1)
            .withf(|key, req| {
                key == "sk-test"
                    && req.model == "tts-1"
                    && req.voice == Voice::Nova
                    && req.input.chars().count() == MAX_SPEECH_INPUT_CHARS
            })
            .returning(|_, _| Ok(vec![7u8; 32000]));

        let synth = AudioSynthesizer::new(Arc::new(mock), "tts-1");
        let audio = synth
            .synthesize("sk-test", &"x".repeat(5000), Voice::Nova)
            .await
            .unwrap();

        assert_eq!(audio.format, "mp3");
        assert_eq!(audio.duration_seconds, 2.0);
        assert_eq!(audio.decode().unwrap(), vec![7u8; 32000]);
    }

    #[tokio::test]
    async fn provider_failure_is_reported() {
        let mut mock = MockTextToSpeechService::new();
        mock.expect_generate_audio()
            .returning(|_, _| Err(PortError::Provider("503".into())));

        let synth = AudioSynthesizer::new(Arc::new(mock), "tts-1");
        let err = synth.synthesize("sk-test", "hello", Voice::Alloy).await.unwrap_err();
        assert!(matches!(err, GenerationError::Provider(msg) if msg.contains("OpenAI API")));
    }
}
