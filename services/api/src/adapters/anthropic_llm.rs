//! services/api/src/adapters/anthropic_llm.rs
//!
//! Implements the `CompletionService` port against the Anthropic Messages API
//! over plain HTTP. System messages are folded into the top-level `system`
//! field; the JSON-object flag has no counterpart and is ignored.

use async_trait::async_trait;
use course_assistant_core::ports::{
    ChatRole, CompletionRequest, CompletionService, PortError, PortResult,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message<'a>>,
    temperature: f32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<serde_json::Value>,
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

#[derive(Clone)]
pub struct AnthropicMessagesAdapter {
    http: reqwest::Client,
    url: String,
}

impl AnthropicMessagesAdapter {
    pub fn new(http: reqwest::Client) -> Self {
        Self::with_url(http, MESSAGES_URL)
    }

    /// Points the adapter at a different Messages endpoint.
    pub fn with_url(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }
}

fn build_body(request: &CompletionRequest) -> MessagesRequest<'_> {
    let system = request
        .messages
        .iter()
        .filter(|m| m.role == ChatRole::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    let messages = request
        .messages
        .iter()
        .filter_map(|m| match m.role {
            ChatRole::System => None,
            ChatRole::User => Some(Message { role: "user", content: &m.content }),
            ChatRole::Assistant => Some(Message { role: "assistant", content: &m.content }),
        })
        .collect();

    MessagesRequest {
        model: &request.model,
        max_tokens: request.max_tokens,
        system: Some(system).filter(|s| !s.is_empty()),
        messages,
        temperature: request.temperature,
    }
}

fn first_text(response: MessagesResponse) -> PortResult<String> {
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or(PortError::EmptyResponse)
}

//=========================================================================================
// `CompletionService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CompletionService for AnthropicMessagesAdapter {
    async fn complete(&self, api_key: &str, request: CompletionRequest) -> PortResult<String> {
        let body = build_body(&request);
        debug!(model = %request.model, "Calling Anthropic messages");

        let response = self
            .http
            .post(&self.url)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&text)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.to_string())
                .unwrap_or(text);
            return Err(PortError::Provider(format!("{}: {}", status, detail)));
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(format!("Malformed Anthropic response: {}", e)))?;
        first_text(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use course_assistant_core::ports::ChatMessage;

    #[test]
    fn system_messages_move_to_the_system_field() {
        let request = CompletionRequest {
            model: "claude-3-7-sonnet-20250219".to_string(),
            messages: vec![ChatMessage::system("Be brief."), ChatMessage::user("Hello")],
            temperature: 0.7,
            max_tokens: 4000,
            json_object: false,
        };
        let body = serde_json::to_value(build_body(&request)).unwrap();
        assert_eq!(body["system"], "Be brief.");
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn first_text_block_is_returned() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"Done."}]}"#,
        )
        .unwrap();
        assert_eq!(first_text(response).unwrap(), "Done.");

        let empty: MessagesResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert!(matches!(first_text(empty), Err(PortError::EmptyResponse)));
    }
}
