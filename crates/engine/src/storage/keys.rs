use serde::{Deserialize, Serialize};

/// The persisted state universe. Every value the engine durably stores lives
/// under one of these keys; the string forms are the wire names the host's
/// key-value store sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageKey {
    /// Ordered `Vec<ResumeEntry>`.
    Resumes,
    /// `Option<String>` — must reference an existing entry or be null.
    ActiveResumeId,
    /// `Option<ResumeProfile>` — global fallback profile.
    Profile,
    /// `PersonalInfo`.
    PersonalInfo,
    /// AI provider credential.
    ApiKey,
    /// Selected AI model identifier.
    Model,
    /// Non-negative monotonic count of successful AI calls.
    UsageCounter,
    /// Whether the tab monitor may propose scans.
    AutoScanEnabled,
    /// `Option<AutoScanRequest>` — the single pending request.
    AutoScanRequest,
}

impl StorageKey {
    pub const ALL: [StorageKey; 9] = [
        StorageKey::Resumes,
        StorageKey::ActiveResumeId,
        StorageKey::Profile,
        StorageKey::PersonalInfo,
        StorageKey::ApiKey,
        StorageKey::Model,
        StorageKey::UsageCounter,
        StorageKey::AutoScanEnabled,
        StorageKey::AutoScanRequest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Resumes => "jobscout_resumes",
            StorageKey::ActiveResumeId => "jobscout_active_resume_id",
            StorageKey::Profile => "jobscout_profile",
            StorageKey::PersonalInfo => "jobscout_personal_info",
            StorageKey::ApiKey => "jobscout_api_key",
            StorageKey::Model => "jobscout_model",
            StorageKey::UsageCounter => "jobscout_usage_counter",
            StorageKey::AutoScanEnabled => "jobscout_auto_scan_enabled",
            StorageKey::AutoScanRequest => "jobscout_auto_scan_request",
        }
    }
}

impl std::fmt::Display for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_names_are_unique() {
        let mut names: Vec<&str> = StorageKey::ALL.iter().map(|k| k.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), StorageKey::ALL.len());
    }
}
