//! services/api/src/adapters/tts.rs
//!
//! This module contains the adapter for OpenAI's Text-to-Speech (TTS) service.
//! It implements the `TextToSpeechService` port from the `core` crate.

use super::openai_client;
use async_openai::{
    error::OpenAIError,
    types::{CreateSpeechRequestArgs, SpeechModel, SpeechResponseFormat, Voice as OpenAiVoice},
};
use async_trait::async_trait;
use course_assistant_core::ports::{PortError, PortResult, SpeechRequest, TextToSpeechService};
use course_assistant_core::Voice;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `TextToSpeechService` port using the OpenAI TTS API.
#[derive(Clone)]
pub struct OpenAiTtsAdapter {
    http: reqwest::Client,
}

impl OpenAiTtsAdapter {
    /// Creates a new `OpenAiTtsAdapter`.
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

fn speech_model(model: &str) -> SpeechModel {
    match model {
        "tts-1" => SpeechModel::Tts1,
        "tts-1-hd" => SpeechModel::Tts1Hd,
        other => SpeechModel::Other(other.to_string()),
    }
}

fn openai_voice(voice: Voice) -> OpenAiVoice {
    match voice {
        Voice::Alloy => OpenAiVoice::Alloy,
        Voice::Echo => OpenAiVoice::Echo,
        Voice::Fable => OpenAiVoice::Fable,
        Voice::Onyx => OpenAiVoice::Onyx,
        Voice::Nova => OpenAiVoice::Nova,
        Voice::Shimmer => OpenAiVoice::Shimmer,
    }
}

//=========================================================================================
// `TextToSpeechService` Trait Implementation
//=========================================================================================

#[async_trait]
impl TextToSpeechService for OpenAiTtsAdapter {
    /// Generates MP3 audio data (`Vec<u8>`) from the request's text.
    async fn generate_audio(&self, api_key: &str, request: SpeechRequest) -> PortResult<Vec<u8>> {
        let speech_request = CreateSpeechRequestArgs::default()
            .model(speech_model(&request.model))
            .voice(openai_voice(request.voice))
            .input(request.input)
            .response_format(SpeechResponseFormat::Mp3)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Call the API and manually map the error, which respects the orphan rule.
        let response = openai_client(&self.http, api_key)
            .audio()
            .speech(speech_request)
            .await
            .map_err(|e: OpenAIError| PortError::Provider(e.to_string()))?;

        // The response contains a `bytes` field. We call `.to_vec()` on that field.
        Ok(response.bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn models_map_to_sdk_variants() {
        assert!(matches!(speech_model("tts-1"), SpeechModel::Tts1));
        assert!(matches!(speech_model("tts-1-hd"), SpeechModel::Tts1Hd));
        assert!(matches!(speech_model("gpt-4o-mini-tts"), SpeechModel::Other(m) if m == "gpt-4o-mini-tts"));
    }

    #[test]
    fn every_voice_has_an_sdk_counterpart() {
        assert!(matches!(openai_voice(Voice::Alloy), OpenAiVoice::Alloy));
        assert!(matches!(openai_voice(Voice::Shimmer), OpenAiVoice::Shimmer));
    }
}
