//! Course description enhancement with a choice of text provider.

use super::{GenerationSettings, PEDAGOGY_EXPERT};
use crate::credentials::ApiKeys;
use crate::domain::TextProvider;
use crate::error::{GenerationError, GenerationResult};
use crate::ports::{ChatMessage, CompletionRequest, CompletionService};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

/// Rewrites a draft course description into a polished one.
#[async_trait]
pub trait DescriptionEnhancer: Send + Sync {
    fn provider(&self) -> TextProvider;

    async fn enhance(&self, title: &str, description: &str) -> GenerationResult<String>;
}

fn enhancement_prompt(title: &str, description: &str) -> String {
    format!(
        "As a pedagogy expert, improve this course description:\n\n\
         Course title: {title}\n\n\
         Initial description: {description}\n\n\
         Please provide an improved description that:\n\
         1. Is professional and engaging\n\
         2. Includes clear learning objectives\n\
         3. Mentions the benefits for the learner\n\
         4. Is structured in concise paragraphs\n\
         5. Is about 150-200 words long"
    )
}

fn require_basics(title: &str, description: &str) -> GenerationResult<()> {
    if title.trim().is_empty() || description.trim().is_empty() {
        return Err(GenerationError::InvalidInput(
            "Please provide a title and an initial description.".to_string(),
        ));
    }
    Ok(())
}

/// What both enhancers share: they differ only in transport, model and
/// token budget.
struct EnhancerTransport {
    completion: Arc<dyn CompletionService>,
    keys: ApiKeys,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl EnhancerTransport {
    async fn enhance(
        &self,
        provider: TextProvider,
        title: &str,
        description: &str,
    ) -> GenerationResult<String> {
        require_basics(title, description)?;
        let api_key = self.keys.resolve(provider)?;

        let request = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(PEDAGOGY_EXPERT),
                ChatMessage::user(enhancement_prompt(title, description)),
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            json_object: false,
        };
        let reply = self
            .completion
            .complete(&api_key, request)
            .await
            .map_err(|e| GenerationError::from_port(provider.vendor_name(), e))?;

        let enhanced = reply.trim();
        if enhanced.is_empty() {
            return Err(GenerationError::Provider(format!(
                "{} API: the model returned an empty reply",
                provider.vendor_name()
            )));
        }
        info!("Description enhanced with {} ({} characters)", provider, enhanced.len());
        Ok(enhanced.to_string())
    }
}

//=========================================================================================
// OpenAI
//=========================================================================================

pub struct OpenAiEnhancer(EnhancerTransport);

impl OpenAiEnhancer {
    pub fn new(completion: Arc<dyn CompletionService>, keys: ApiKeys, settings: &GenerationSettings) -> Self {
        Self(EnhancerTransport {
            completion,
            keys,
            model: settings.chat_model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.openai_description_max_tokens,
        })
    }
}

#[async_trait]
impl DescriptionEnhancer for OpenAiEnhancer {
    fn provider(&self) -> TextProvider {
        TextProvider::OpenAi
    }

    async fn enhance(&self, title: &str, description: &str) -> GenerationResult<String> {
        self.0.enhance(TextProvider::OpenAi, title, description).await
    }
}

//=========================================================================================
// Anthropic
//=========================================================================================

pub struct AnthropicEnhancer(EnhancerTransport);

impl AnthropicEnhancer {
    pub fn new(completion: Arc<dyn CompletionService>, keys: ApiKeys, settings: &GenerationSettings) -> Self {
        Self(EnhancerTransport {
            completion,
            keys,
            model: settings.anthropic_model.clone(),
            temperature: settings.temperature,
            max_tokens: settings.anthropic_description_max_tokens,
        })
    }
}

#[async_trait]
impl DescriptionEnhancer for AnthropicEnhancer {
    fn provider(&self) -> TextProvider {
        TextProvider::Anthropic
    }

    async fn enhance(&self, title: &str, description: &str) -> GenerationResult<String> {
        self.0.enhance(TextProvider::Anthropic, title, description).await
    }
}

/// Builds the enhancer for `provider` from the two provider transports.
pub fn enhancer_for(
    provider: TextProvider,
    openai: Arc<dyn CompletionService>,
    anthropic: Arc<dyn CompletionService>,
    keys: ApiKeys,
    settings: &GenerationSettings,
) -> Box<dyn DescriptionEnhancer> {
    match provider {
        TextProvider::OpenAi => Box::new(OpenAiEnhancer::new(openai, keys, settings)),
        TextProvider::Anthropic => Box::new(AnthropicEnhancer::new(anthropic, keys, settings)),
    }
}
