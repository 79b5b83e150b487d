use thiserror::Error;

/// Engine-level error type.
///
/// Every fallible operation in the crate returns `Result<T, EngineError>` so
/// the embedding layer can match on the variant and render an actionable
/// message instead of a generic failure.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("No active resume — upload and select a resume first")]
    NoActiveResume,

    #[error("No AI provider configured: {0}")]
    NoProviderConfigured(String),

    #[error("Usage limit reached ({used}/{ceiling} analyses)")]
    CreditExhausted { used: u32, ceiling: u32 },

    #[error("AI provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("AI provider returned an unusable response: {0}")]
    MalformedResponse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl EngineError {
    /// Whether retrying the same operation with the same input can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            EngineError::ProviderUnavailable(_) | EngineError::Storage(_)
        )
    }
}
