//! OpenAI chat completions client.

use super::config::{OPENAI_API_BASE, OpenAIConfig};
use super::convert::{self, ChatCompletionRequest, ChatCompletionResponse};
use crate::retry::{
    RetryConfig, execute_with_retry, is_retryable_model_error, is_retryable_status_code,
};
use async_stream::try_stream;
use async_trait::async_trait;
use bookreel_core::{
    BookreelError, Content, Llm, LlmRequest, LlmResponse, LlmResponseStream, Part,
};
use futures::StreamExt;
use reqwest::Client;
use tracing::Instrument;

/// OpenAI client.
///
/// Retries are off unless enabled with [`OpenAIClient::with_retry_config`], so
/// upstream failures surface to the caller unchanged.
///
/// # Example
///
/// ```rust,ignore
/// use bookreel_model::openai::{OpenAIClient, OpenAIConfig};
///
/// let client = OpenAIClient::new(OpenAIConfig::new(api_key, "gpt-4o-mini"))?;
/// ```
pub struct OpenAIClient {
    client: Client,
    config: OpenAIConfig,
    retry_config: RetryConfig,
}

impl OpenAIClient {
    pub fn new(config: OpenAIConfig) -> Result<Self, BookreelError> {
        let client = Client::builder()
            .build()
            .map_err(|e| BookreelError::Model(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config, retry_config: RetryConfig::disabled() })
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry_config: RetryConfig) -> Self {
        self.retry_config = retry_config;
        self
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry_config
    }

    fn api_url(&self) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(OPENAI_API_BASE);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    fn build_request(&self, request: &LlmRequest, stream: bool) -> ChatCompletionRequest {
        let messages: Vec<_> = request.contents.iter().map(convert::content_to_message).collect();
        let config = request.config.as_ref();

        let model = if request.model.is_empty() {
            self.config.model.clone()
        } else {
            request.model.clone()
        };

        ChatCompletionRequest {
            model,
            messages,
            temperature: config.and_then(|c| c.temperature),
            top_p: config.and_then(|c| c.top_p),
            max_tokens: config
                .and_then(|c| c.max_output_tokens)
                .map(|t| t as u32)
                .or(self.config.max_tokens),
            stream: Some(stream),
            response_format: config
                .and_then(|c| c.response_schema.as_ref())
                .map(convert::response_format),
        }
    }
}

#[async_trait]
impl Llm for OpenAIClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn generate_content(
        &self,
        request: LlmRequest,
        stream: bool,
    ) -> Result<LlmResponseStream, BookreelError> {
        let api_url = self.api_url();
        let api_key = self.config.api_key.clone();
        let organization = self.config.organization_id.clone();
        let chat_request = self.build_request(&request, stream);
        let client = self.client.clone();
        let retry_config = self.retry_config.clone();
        let span = bookreel_telemetry::model_call_span(&chat_request.model);

        let response = execute_with_retry(&retry_config, is_retryable_model_error, || {
            let client = client.clone();
            let api_url = api_url.clone();
            let api_key = api_key.clone();
            let organization = organization.clone();
            let chat_request = chat_request.clone();
            async move {
                let mut builder = client
                    .post(&api_url)
                    .header("Authorization", format!("Bearer {}", api_key))
                    .header("Content-Type", "application/json");
                if let Some(org) = organization {
                    builder = builder.header("OpenAI-Organization", org);
                }

                let response = builder.json(&chat_request).send().await.map_err(|e| {
                    let retryability = if e.is_timeout() || e.is_connect() {
                        "retryable"
                    } else {
                        "non-retryable"
                    };
                    BookreelError::Model(format!(
                        "OpenAI API request failed ({}): {}",
                        retryability, e
                    ))
                })?;

                if !response.status().is_success() {
                    let status = response.status();
                    let error_text = response.text().await.unwrap_or_default();
                    let retryability = if is_retryable_status_code(status.as_u16()) {
                        "retryable"
                    } else {
                        "non-retryable"
                    };
                    return Err(BookreelError::Model(format!(
                        "OpenAI API error ({}, {}): {}",
                        status, retryability, error_text
                    )));
                }

                Ok(response)
            }
        })
        .instrument(span)
        .await?;

        let response_stream = try_stream! {
            if stream {
                let mut byte_stream = response.bytes_stream();
                let mut lines = LineBuffer::default();

                while let Some(chunk_result) = byte_stream.next().await {
                    let chunk = chunk_result
                        .map_err(|e| BookreelError::Model(format!("Stream read error: {}", e)))?;
                    lines.extend(&chunk);

                    while let Some(line) = lines.next_line() {
                        let Some(data) = line.strip_prefix("data: ") else { continue };
                        if data == "[DONE]" {
                            continue;
                        }

                        match serde_json::from_str::<ChatCompletionResponse>(data) {
                            Ok(chunk_response) => {
                                let Some(choice) = chunk_response.choices.first() else { continue };
                                let text = choice.delta.as_ref().and_then(|d| d.content.clone());
                                let finish_reason =
                                    choice.finish_reason.as_deref().map(convert::finish_reason);
                                let done = finish_reason.is_some();

                                if text.as_deref().is_some_and(|t| !t.is_empty()) || done {
                                    yield LlmResponse {
                                        content: text.filter(|t| !t.is_empty()).map(|text| Content {
                                            role: "model".to_string(),
                                            parts: vec![Part::Text { text }],
                                        }),
                                        usage_metadata: None,
                                        finish_reason,
                                        partial: !done,
                                        turn_complete: done,
                                    };
                                }
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse OpenAI chunk: {} - {}", e, data);
                            }
                        }
                    }
                }
            } else {
                let response_text = response.text().await
                    .map_err(|e| BookreelError::Model(format!("Failed to read response: {}", e)))?;

                let chat_response: ChatCompletionResponse = serde_json::from_str(&response_text)
                    .map_err(|e| BookreelError::Model(format!(
                        "Failed to parse response: {} - {}",
                        e, response_text
                    )))?;

                yield convert::from_response(&chat_response);
            }
        };

        Ok(Box::pin(response_stream))
    }
}

/// Bytes of an SSE body, split on `\n`. Lines are decoded only once complete
/// so a multibyte character split across chunks stays intact.
#[derive(Default)]
struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    fn extend(&mut self, chunk: &[u8]) {
        self.pending.extend_from_slice(chunk);
    }

    fn next_line(&mut self) -> Option<String> {
        let end = self.pending.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.pending.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line).trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_split_inside_a_character_decodes_whole() {
        let line = "data: {\"content\":\"Amélie\"}\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xC3).unwrap() + 1;

        let mut lines = LineBuffer::default();
        lines.extend(&line[..split]);
        assert_eq!(lines.next_line(), None);
        lines.extend(&line[split..]);
        assert_eq!(lines.next_line().as_deref(), Some("data: {\"content\":\"Amélie\"}"));
        assert_eq!(lines.next_line(), None);
    }

    #[test]
    fn several_lines_in_one_chunk() {
        let mut lines = LineBuffer::default();
        lines.extend(b"data: a\r\n\ndata: b\npartial");
        assert_eq!(lines.next_line().as_deref(), Some("data: a"));
        assert_eq!(lines.next_line().as_deref(), Some(""));
        assert_eq!(lines.next_line().as_deref(), Some("data: b"));
        assert_eq!(lines.next_line(), None);
    }
}
