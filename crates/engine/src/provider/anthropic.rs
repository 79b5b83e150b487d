//! Anthropic Messages API client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{backoff_delay, AiProvider, ProviderError, ProviderRequest};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

impl AnthropicResponse {
    /// Text of the first text block, if any.
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|b| b.block_type == "text")
            .and_then(|b| b.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorBody,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct AnthropicClient {
    client: Client,
    api_key: String,
    max_retries: u32,
}

impl AnthropicClient {
    pub fn new(api_key: &str, attempt_timeout: Duration, max_retries: u32) -> Self {
        Self {
            client: Client::builder()
                .timeout(attempt_timeout)
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.to_string(),
            max_retries,
        }
    }
}

#[async_trait]
impl AiProvider for AnthropicClient {
    /// Calls the Messages API. Retries on 429 and 5xx with exponential
    /// backoff. The `json_response` hint has no API-level switch here; the
    /// system prompt already demands JSON-only output.
    async fn invoke(&self, request: &ProviderRequest) -> Result<String, ProviderError> {
        let request_body = AnthropicRequest {
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: vec![AnthropicMessage {
                role: "user",
                content: &request.prompt,
            }],
        };

        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "Anthropic call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(ANTHROPIC_API_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .header("content-type", "application/json")
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(ProviderError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Anthropic API returned {}: {}", status, body);
                last_error = Some(ProviderError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                let message = serde_json::from_str::<AnthropicError>(&body)
                    .map(|e| e.error.message)
                    .unwrap_or(body);
                return Err(ProviderError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let parsed: AnthropicResponse = response.json().await?;
            let content = parsed
                .text()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .ok_or(ProviderError::EmptyContent)?;

            debug!("Anthropic call succeeded ({} chars)", content.len());
            return Ok(content);
        }

        Err(last_error.unwrap_or(ProviderError::RateLimited {
            retries: self.max_retries,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_extraction_skips_non_text_blocks() {
        let json = r#"{"content": [
            {"type": "thinking", "text": null},
            {"type": "text", "text": "{\"score\": 55}"}
        ]}"#;
        let parsed: AnthropicResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.text(), Some("{\"score\": 55}"));
    }

    #[test]
    fn test_no_text_block_is_none() {
        let parsed: AnthropicResponse = serde_json::from_str(r#"{"content": []}"#).unwrap();
        assert_eq!(parsed.text(), None);
    }
}
