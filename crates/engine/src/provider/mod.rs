//! Outbound AI provider boundary.
//!
//! ARCHITECTURAL RULE: no other module may call a provider HTTP API
//! directly. The orchestrator sees exactly one seam — [`AiProvider::invoke`]
//! — so tests substitute a mock and the engine never learns which vendor
//! answered.

pub mod anthropic;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::errors::EngineError;
use crate::matching::selector::{AiVendor, ModelChoice};

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

/// A fully-shaped provider call. Built deterministically by the orchestrator:
/// identical inputs produce an identical request, which golden tests rely on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderRequest {
    pub model: String,
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Ask the provider for a JSON-object response where the API supports it.
    pub json_response: bool,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("provider returned empty content")]
    EmptyContent,
}

impl From<ProviderError> for EngineError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::EmptyContent => {
                EngineError::MalformedResponse("provider returned empty content".to_string())
            }
            other => EngineError::ProviderUnavailable(other.to_string()),
        }
    }
}

/// The single outbound AI call. Returns the raw text of the completion;
/// parsing into a typed result happens at the orchestrator boundary.
#[async_trait]
pub trait AiProvider: Send + Sync {
    async fn invoke(&self, request: &ProviderRequest) -> Result<String, ProviderError>;
}

/// Builds the concrete client for a resolved model choice.
pub fn build_client(
    choice: &ModelChoice,
    api_key: &str,
    attempt_timeout: Duration,
    max_retries: u32,
) -> Arc<dyn AiProvider> {
    match choice.vendor {
        AiVendor::OpenAi => Arc::new(OpenAiClient::new(api_key, attempt_timeout, max_retries)),
        AiVendor::Anthropic => Arc::new(AnthropicClient::new(api_key, attempt_timeout, max_retries)),
    }
}

/// Exponential backoff for retryable provider failures: 1s, 2s, 4s, ...
pub(crate) fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_millis(1000 * (1 << (attempt - 1)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(4));
    }

    #[test]
    fn test_empty_content_maps_to_malformed_response() {
        let err: EngineError = ProviderError::EmptyContent.into();
        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[test]
    fn test_api_error_maps_to_provider_unavailable() {
        let err: EngineError = ProviderError::Api {
            status: 500,
            message: "overloaded".to_string(),
        }
        .into();
        assert!(matches!(err, EngineError::ProviderUnavailable(_)));
        assert!(err.is_retryable());
    }
}
