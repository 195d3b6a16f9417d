//! Wire types for the chat completions API.

use bookreel_core::{Content, FinishReason, LlmResponse, Part, UsageMetadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<ResponseFormat>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    JsonSchema { json_schema: JsonSchemaFormat },
}

#[derive(Debug, Clone, Serialize)]
pub struct JsonSchemaFormat {
    pub name: String,
    pub schema: Value,
    pub strict: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub delta: Option<DeltaMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct DeltaMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

pub fn content_to_message(content: &Content) -> Message {
    let role = match content.role.as_str() {
        "model" | "assistant" => "assistant",
        "system" => "system",
        _ => "user",
    };
    Message { role: role.to_string(), content: Some(content.text()) }
}

/// Wrap a JSON schema for the `response_format` field.
///
/// Strict mode is only requested for schemas that close their object with
/// `additionalProperties: false`, since the API rejects it otherwise.
pub fn response_format(schema: &Value) -> ResponseFormat {
    let name = schema
        .get("title")
        .and_then(Value::as_str)
        .map(|t| t.chars().filter(|c| c.is_ascii_alphanumeric() || *c == '_').collect::<String>())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| "response".to_string());
    let strict = schema.get("additionalProperties") == Some(&Value::Bool(false));
    ResponseFormat::JsonSchema {
        json_schema: JsonSchemaFormat { name, schema: schema.clone(), strict },
    }
}

pub fn finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" | "tool_calls" => FinishReason::Stop,
        "length" => FinishReason::MaxTokens,
        "content_filter" => FinishReason::Safety,
        _ => FinishReason::Other,
    }
}

pub fn from_response(response: &ChatCompletionResponse) -> LlmResponse {
    let choice = response.choices.first();
    let text = choice.and_then(|c| c.message.as_ref()).and_then(|m| m.content.clone());

    LlmResponse {
        content: text.map(|text| Content { role: "model".to_string(), parts: vec![Part::Text { text }] }),
        usage_metadata: response.usage.as_ref().map(|u| UsageMetadata {
            prompt_token_count: u.prompt_tokens as i32,
            candidates_token_count: u.completion_tokens as i32,
            total_token_count: u.total_tokens as i32,
        }),
        finish_reason: choice.and_then(|c| c.finish_reason.as_deref()).map(finish_reason),
        partial: false,
        turn_complete: true,
    }
}
