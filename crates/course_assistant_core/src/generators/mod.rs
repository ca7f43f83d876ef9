//! crates/course_assistant_core/src/generators/mod.rs
//!
//! Prompt construction and reply parsing for every generated artifact.
//! Each generator resolves its credential, makes exactly one completion call
//! and returns either the parsed artifact or a `GenerationError`.

pub mod chapter;
pub mod description;
pub mod lists;
pub mod podcast;
pub mod quiz;
pub mod structure;

pub use description::{enhancer_for, AnthropicEnhancer, DescriptionEnhancer, OpenAiEnhancer};
pub use structure::ReferenceMaterial;

use crate::credentials::ApiKeys;
use crate::domain::TextProvider;
use crate::error::{GenerationError, GenerationResult};
use crate::ports::{ChatMessage, CompletionRequest, CompletionService};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{info, warn};

/// System prompt shared by the free-text generators.
pub(crate) const PEDAGOGY_EXPERT: &str =
    "You are a pedagogy expert specialised in creating educational content.";

//=========================================================================================
// Settings
//=========================================================================================

/// Models and token budgets used by the generators.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Free-text generators and the OpenAI description enhancer.
    pub chat_model: String,
    /// JSON-mode generators.
    pub structured_model: String,
    pub anthropic_model: String,
    pub temperature: f32,
    pub list_max_tokens: u32,
    pub structured_max_tokens: u32,
    pub openai_description_max_tokens: u32,
    pub anthropic_description_max_tokens: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            chat_model: "gpt-4o".to_string(),
            structured_model: "gpt-4-turbo".to_string(),
            anthropic_model: "claude-3-7-sonnet-20250219".to_string(),
            temperature: 0.7,
            list_max_tokens: 1000,
            structured_max_tokens: 4000,
            openai_description_max_tokens: 5000,
            anthropic_description_max_tokens: 4000,
        }
    }
}

//=========================================================================================
// The Generator
//=========================================================================================

/// Runs the OpenAI-backed generators: lists, structure, chapter content,
/// quizzes and podcast scripts.
#[derive(Clone)]
pub struct ContentGenerator {
    completion: Arc<dyn CompletionService>,
    keys: ApiKeys,
    settings: GenerationSettings,
}

impl ContentGenerator {
    pub fn new(
        completion: Arc<dyn CompletionService>,
        keys: ApiKeys,
        settings: GenerationSettings,
    ) -> Self {
        Self { completion, keys, settings }
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Free-text completion with the chat model. Returns the trimmed reply.
    pub(crate) async fn complete_text(&self, system: &str, prompt: String) -> GenerationResult<String> {
        let request = CompletionRequest {
            model: self.settings.chat_model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            temperature: self.settings.temperature,
            max_tokens: self.settings.list_max_tokens,
            json_object: false,
        };
        self.run(request).await
    }

    /// JSON-mode completion with the structured model, decoded into `T`.
    pub(crate) async fn complete_json<T: DeserializeOwned>(
        &self,
        system: &str,
        prompt: String,
    ) -> GenerationResult<T> {
        let request = CompletionRequest {
            model: self.settings.structured_model.clone(),
            messages: vec![ChatMessage::system(system), ChatMessage::user(prompt)],
            temperature: self.settings.temperature,
            max_tokens: self.settings.structured_max_tokens,
            json_object: true,
        };
        let reply = self.run(request).await?;
        serde_json::from_str(&reply).map_err(|e| {
            warn!("Model reply did not match the requested schema: {}", e);
            GenerationError::Parse(e.to_string())
        })
    }

    async fn run(&self, request: CompletionRequest) -> GenerationResult<String> {
        let api_key = self.keys.resolve(TextProvider::OpenAi)?;
        let model = request.model.clone();
        let reply = self
            .completion
            .complete(&api_key, request)
            .await
            .map_err(|e| GenerationError::from_port(TextProvider::OpenAi.vendor_name(), e))?;

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(GenerationError::Provider(
                "OpenAI API: the model returned an empty reply".to_string(),
            ));
        }
        info!("Received {} characters from {}", reply.len(), model);
        Ok(reply.to_string())
    }
}

//=========================================================================================
// Reply Parsing
//=========================================================================================

/// Extracts list items from a free-text reply.
///
/// Keeps lines that start with a digit or a `- ` bullet and strips the leading
/// numbering, dots, dashes and spaces. When no line qualifies the whole reply
/// is returned as a single item, so nothing the model wrote is lost.
pub fn parse_list_reply(reply: &str) -> Vec<String> {
    let items: Vec<String> = reply
        .lines()
        .map(str::trim)
        .filter(|line| {
            line.starts_with(|c: char| c.is_ascii_digit()) || line.starts_with("- ")
        })
        .map(|line| {
            line.trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | '-' | ' '))
                .to_string()
        })
        .collect();

    if items.is_empty() {
        vec![reply.trim().to_string()]
    } else {
        items
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::ports::MockCompletionService;

    /// A generator wired to `mock` with an explicit OpenAI key.
    pub fn generator(mock: MockCompletionService) -> ContentGenerator {
        ContentGenerator::new(
            Arc::new(mock),
            ApiKeys::new(Some("sk-test".to_string()), None),
            GenerationSettings::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{MockCompletionService, PortError};
    use serial_test::serial;

    #[test]
    fn numbered_reply_is_split_into_items() {
        assert_eq!(parse_list_reply("1. Foo\n2. Bar"), vec!["Foo", "Bar"]);
    }

    #[test]
    fn bullets_are_kept_and_prose_dropped() {
        let reply = "Here are the prerequisites:\n- Basic algebra\n- A spreadsheet tool\n\nGood luck!";
        assert_eq!(parse_list_reply(reply), vec!["Basic algebra", "A spreadsheet tool"]);
    }

    #[test]
    fn unstructured_reply_becomes_one_item() {
        assert_eq!(parse_list_reply("Just one line"), vec!["Just one line"]);
    }

    #[test]
    fn multi_digit_numbering_is_stripped() {
        assert_eq!(parse_list_reply("10. Tenth\n11 - Eleventh"), vec!["Tenth", "Eleventh"]);
    }

    #[tokio::test]
    #[serial]
    async fn missing_credential_makes_no_call() {
        std::env::remove_var("OPENAI_API_KEY");
        let mut mock = MockCompletionService::new();
        mock.expect_complete().times(0);
        let generator =
            ContentGenerator::new(Arc::new(mock), ApiKeys::default(), GenerationSettings::default());

        let err = generator
            .complete_text(PEDAGOGY_EXPERT, "prompt".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::MissingCredential { env_var: "OPENAI_API_KEY", .. }
        ));
    }

    #[tokio::test]
    async fn json_requests_use_structured_settings() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .withf(|_, req| {
                req.json_object && req.model == "gpt-4-turbo" && req.max_tokens == 4000
            })
            .returning(|_, _| Ok(r#"{"value": 3}"#.to_string()));

        #[derive(serde::Deserialize)]
        struct Reply {
            value: u32,
        }
        let reply: Reply = test_support::generator(mock)
            .complete_json("system", "prompt".to_string())
            .await
            .unwrap();
        assert_eq!(reply.value, 3);
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete().returning(|_, _| Ok("not json".to_string()));

        let result: GenerationResult<serde_json::Value> = test_support::generator(mock)
            .complete_json("system", "prompt".to_string())
            .await;
        assert!(matches!(result, Err(GenerationError::Parse(_))));
    }

    #[tokio::test]
    async fn provider_failure_names_the_vendor() {
        let mut mock = MockCompletionService::new();
        mock.expect_complete()
            .returning(|_, _| Err(PortError::Provider("429 Too Many Requests".into())));

        let err = test_support::generator(mock)
            .complete_text("system", "prompt".to_string())
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Error while calling the OpenAI API: Provider error: 429 Too Many Requests"
        );
    }
}
