use std::time::Duration;

use anyhow::{Context, Result};

/// Engine tuning knobs, loaded from environment variables with defaults.
///
/// Per-user settings (API credential, selected model, auto-scan flag) are
/// *not* configuration — they live in the injected storage adapter and can
/// change at runtime.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of successful AI calls before further calls are refused.
    pub usage_ceiling: u32,
    /// Quiet window after a candidate navigation before a scan is proposed.
    pub debounce_ms: i64,
    /// Window during which a scanned tab+URL pair is not re-proposed.
    pub scan_cooldown_ms: i64,
    /// Hard wall-clock budget for a single AI analysis call.
    pub ai_timeout: Duration,
    /// Retry budget for transient provider failures (429 / 5xx).
    pub ai_max_retries: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            usage_ceiling: 50,
            debounce_ms: 1500,
            scan_cooldown_ms: 30_000,
            ai_timeout: Duration::from_secs(120),
            ai_max_retries: 3,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let defaults = EngineConfig::default();
        Ok(EngineConfig {
            usage_ceiling: env_or("JOBSCOUT_USAGE_CEILING", defaults.usage_ceiling)?,
            debounce_ms: env_or("JOBSCOUT_DEBOUNCE_MS", defaults.debounce_ms)?,
            scan_cooldown_ms: env_or("JOBSCOUT_SCAN_COOLDOWN_MS", defaults.scan_cooldown_ms)?,
            ai_timeout: Duration::from_secs(env_or(
                "JOBSCOUT_AI_TIMEOUT_SECS",
                defaults.ai_timeout.as_secs(),
            )?),
            ai_max_retries: env_or("JOBSCOUT_AI_MAX_RETRIES", defaults.ai_max_retries)?,
        })
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' is not a valid value")),
        Err(_) => Ok(default),
    }
}
