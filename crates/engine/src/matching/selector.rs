//! Model selection — resolves the stored user configuration into the
//! concrete provider/model pair to invoke. Deterministic: the same settings
//! always yield the same choice, and the returned choice names exactly the
//! model that will be called (no hidden fallback substitution).

use serde::{Deserialize, Serialize};

use crate::errors::EngineError;
use crate::storage::{Storage, StorageKey};

/// Used when the user has a credential but never picked a model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiVendor {
    OpenAi,
    Anthropic,
}

/// The resolved model to invoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelChoice {
    pub vendor: AiVendor,
    pub model: String,
}

/// Per-user AI settings as stored: credential plus selected model id.
#[derive(Debug, Clone, Default)]
pub struct AiSettings {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

impl AiSettings {
    pub async fn load(storage: &Storage) -> Result<Self, EngineError> {
        Ok(AiSettings {
            api_key: storage.read::<String>(StorageKey::ApiKey).await?,
            model: storage.read::<String>(StorageKey::Model).await?,
        })
    }
}

/// Resolves the configured provider/model. A missing or blank credential is
/// `NoProviderConfigured`; a missing model falls back to [`DEFAULT_MODEL`]
/// (and the caller sees that in the returned choice); a model id no known
/// vendor serves is refused rather than silently substituted.
pub fn select_model(settings: &AiSettings) -> Result<ModelChoice, EngineError> {
    match settings.api_key.as_deref() {
        Some(key) if !key.trim().is_empty() => {}
        _ => {
            return Err(EngineError::NoProviderConfigured(
                "no API key set".to_string(),
            ))
        }
    }

    let model = settings
        .model
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_MODEL);

    let vendor = vendor_for(model).ok_or_else(|| {
        EngineError::NoProviderConfigured(format!("unrecognized model '{model}'"))
    })?;

    Ok(ModelChoice {
        vendor,
        model: model.to_string(),
    })
}

fn vendor_for(model: &str) -> Option<AiVendor> {
    if model.starts_with("gpt-")
        || model.starts_with("o1")
        || model.starts_with("o3")
        || model.starts_with("o4")
    {
        Some(AiVendor::OpenAi)
    } else if model.starts_with("claude-") {
        Some(AiVendor::Anthropic)
    } else {
        None
    }
}
