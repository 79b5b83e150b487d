//! Analysis orchestrator — shapes provider requests, enforces the usage
//! ceiling, and maps provider output (or failure) into typed results.
//!
//! Usage accounting rule: the counter is checked before any outbound call
//! and incremented only after a successful response. Failures, timeouts and
//! cancellations never charge the user. Because the counter lives behind an
//! async storage adapter, the increment re-reads the stored value immediately
//! before committing instead of trusting the pre-call read.

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::errors::EngineError;
use crate::matching::prompts::{
    MATCH_PROMPT_TEMPLATE, MATCH_SYSTEM, PROFILE_EXTRACT_SYSTEM, PROFILE_EXTRACT_TEMPLATE,
};
use crate::matching::selector::ModelChoice;
use crate::models::analysis::MatchReport;
use crate::models::resume::ResumeProfile;
use crate::provider::{AiProvider, ProviderRequest};
use crate::storage::{Storage, StorageKey};

/// Caps applied before prompt interpolation, in characters.
const MATCH_INPUT_CAP: usize = 4000;
const EXTRACT_INPUT_CAP: usize = 50_000;

const MAX_COMPLETION_TOKENS: u32 = 4096;

#[derive(Clone)]
pub struct MatchOrchestrator {
    storage: Storage,
    config: EngineConfig,
}

impl MatchOrchestrator {
    pub fn new(storage: Storage, config: EngineConfig) -> Self {
        MatchOrchestrator { storage, config }
    }

    /// Runs a match analysis for a sanitized job text against the active
    /// resume profile.
    pub async fn analyze(
        &self,
        provider: &dyn AiProvider,
        job_text: &str,
        profile: Option<&ResumeProfile>,
        choice: &ModelChoice,
    ) -> Result<MatchReport, EngineError> {
        if job_text.trim().is_empty() {
            return Err(EngineError::Validation(
                "job text is empty after sanitization".to_string(),
            ));
        }
        let profile = profile.ok_or(EngineError::NoActiveResume)?;

        self.check_ceiling().await?;

        let request = build_match_request(job_text, profile, choice);
        let raw = self.invoke(provider, &request).await?;
        let report = parse_report(&raw)?;

        self.commit_usage().await?;
        info!(
            "match analysis complete: score {} ({} matched, {} missing)",
            report.score,
            report.matched_skills.len(),
            report.missing_skills.len()
        );
        Ok(report)
    }

    /// Extracts a structured profile from raw resume text.
    pub async fn extract_profile(
        &self,
        provider: &dyn AiProvider,
        resume_text: &str,
        choice: &ModelChoice,
    ) -> Result<ResumeProfile, EngineError> {
        if resume_text.trim().is_empty() {
            return Err(EngineError::Validation(
                "resume text is empty".to_string(),
            ));
        }

        self.check_ceiling().await?;

        let request = build_extract_request(resume_text, choice);
        let raw = self.invoke(provider, &request).await?;
        let profile = parse_profile(&raw)?;

        self.commit_usage().await?;
        info!(
            "profile extraction complete: {} skills, {} roles",
            profile.skills.len(),
            profile.experience.len()
        );
        Ok(profile)
    }

    /// Successful AI calls so far.
    pub async fn usage(&self) -> Result<u32, EngineError> {
        Ok(self
            .storage
            .read::<u32>(StorageKey::UsageCounter)
            .await?
            .unwrap_or(0))
    }

    /// Invokes the provider under the configured hard wall-clock budget. A
    /// timed-out call surfaces as retryable and charges nothing.
    async fn invoke(
        &self,
        provider: &dyn AiProvider,
        request: &ProviderRequest,
    ) -> Result<String, EngineError> {
        match tokio::time::timeout(self.config.ai_timeout, provider.invoke(request)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(EngineError::ProviderUnavailable(format!(
                "call exceeded {}s budget",
                self.config.ai_timeout.as_secs()
            ))),
        }
    }

    async fn check_ceiling(&self) -> Result<(), EngineError> {
        let used = self.usage().await?;
        if used >= self.config.usage_ceiling {
            return Err(EngineError::CreditExhausted {
                used,
                ceiling: self.config.usage_ceiling,
            });
        }
        Ok(())
    }

    async fn commit_usage(&self) -> Result<(), EngineError> {
        // Re-read: another event may have advanced the counter while the
        // provider call was in flight.
        let used = self.usage().await?;
        self.storage
            .write(StorageKey::UsageCounter, &(used + 1))
            .await?;
        debug!("usage counter now {}", used + 1);
        Ok(())
    }
}

/// Shapes the match-analysis call. Pure and deterministic: identical inputs
/// yield an identical request, byte for byte.
pub fn build_match_request(
    job_text: &str,
    profile: &ResumeProfile,
    choice: &ModelChoice,
) -> ProviderRequest {
    let prompt = MATCH_PROMPT_TEMPLATE
        .replace("{job_text}", truncate_chars(job_text, MATCH_INPUT_CAP))
        .replace(
            "{resume_text}",
            truncate_chars(&resume_summary(profile), MATCH_INPUT_CAP),
        );
    ProviderRequest {
        model: choice.model.clone(),
        system: MATCH_SYSTEM.to_string(),
        prompt,
        temperature: 0.0,
        max_tokens: MAX_COMPLETION_TOKENS,
        json_response: true,
    }
}

/// Shapes the profile-extraction call.
pub fn build_extract_request(resume_text: &str, choice: &ModelChoice) -> ProviderRequest {
    let prompt = PROFILE_EXTRACT_TEMPLATE.replace(
        "{resume_text}",
        truncate_chars(resume_text, EXTRACT_INPUT_CAP),
    );
    ProviderRequest {
        model: choice.model.clone(),
        system: PROFILE_EXTRACT_SYSTEM.to_string(),
        prompt,
        temperature: 0.2,
        max_tokens: MAX_COMPLETION_TOKENS,
        json_response: true,
    }
}

/// Flattens a structured profile into the text block the prompts embed.
/// Section order is fixed; list order follows the profile.
pub fn resume_summary(profile: &ResumeProfile) -> String {
    let mut sections: Vec<String> = Vec::new();

    if !profile.summary.trim().is_empty() {
        sections.push(format!("Summary: {}", profile.summary));
    }
    if let Some(info) = &profile.personal_info {
        sections.push(format!(
            "Contact: {} | {} | {}",
            info.name.as_deref().unwrap_or(""),
            info.email.as_deref().unwrap_or(""),
            info.linkedin.as_deref().unwrap_or(""),
        ));
    }
    if !profile.skills.is_empty() {
        sections.push(format!("Skills: {}", profile.skills.join(", ")));
    }
    if !profile.experience.is_empty() {
        sections.push(
            profile
                .experience
                .iter()
                .map(|e| {
                    let dates = if e.dates.is_empty() { "N/A" } else { &e.dates };
                    format!(
                        "Role: {} at {} ({})\nDetails: {}",
                        e.title, e.company, dates, e.description
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        );
    }
    if !profile.projects.is_empty() {
        sections.push(
            profile
                .projects
                .iter()
                .map(|p| {
                    format!(
                        "Project: {} ({})\nDetails: {}",
                        p.name, p.technologies, p.description
                    )
                })
                .collect::<Vec<_>>()
                .join("\n\n"),
        );
    }
    if !profile.education.is_empty() {
        sections.push(
            profile
                .education
                .iter()
                .map(|e| format!("Education: {} at {} ({})", e.degree, e.school, e.dates))
                .collect::<Vec<_>>()
                .join("\n"),
        );
    }

    sections.join("\n\n")
}

/// Parses the provider's match payload. Well-formed JSON missing fields
/// degrades to a partial report; anything unparsable is `MalformedResponse`.
pub fn parse_report(raw: &str) -> Result<MatchReport, EngineError> {
    let text = strip_json_fences(raw);
    serde_json::from_str(text)
        .map_err(|e| EngineError::MalformedResponse(format!("match payload: {e}")))
}

pub fn parse_profile(raw: &str) -> Result<ResumeProfile, EngineError> {
    let text = strip_json_fences(raw);
    serde_json::from_str(text)
        .map_err(|e| EngineError::MalformedResponse(format!("profile payload: {e}")))
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

/// Char-safe truncation; byte slicing would panic mid-codepoint.
fn truncate_chars(text: &str, cap: usize) -> &str {
    match text.char_indices().nth(cap) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::matching::selector::AiVendor;
    use crate::provider::ProviderError;
    use crate::storage::MemoryStorage;

    const REPORT_JSON: &str = r#"{
        "score": 72,
        "summary": "Solid systems match.",
        "matched_skills": ["Rust"],
        "missing_skills": ["Terraform"],
        "tips": ["Mention IaC work."]
    }"#;

    /// Canned provider: counts invocations, returns a fixed outcome.
    struct MockProvider {
        response: Result<String, u16>,
        calls: AtomicU32,
    }

    impl MockProvider {
        fn ok(body: &str) -> Self {
            MockProvider {
                response: Ok(body.to_string()),
                calls: AtomicU32::new(0),
            }
        }

        fn failing(status: u16) -> Self {
            MockProvider {
                response: Err(status),
                calls: AtomicU32::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AiProvider for MockProvider {
        async fn invoke(&self, _request: &ProviderRequest) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(body) => Ok(body.clone()),
                Err(status) => Err(ProviderError::Api {
                    status: *status,
                    message: "simulated".to_string(),
                }),
            }
        }
    }

    fn choice() -> ModelChoice {
        ModelChoice {
            vendor: AiVendor::OpenAi,
            model: "gpt-4o-mini".to_string(),
        }
    }

    fn profile() -> ResumeProfile {
        ResumeProfile {
            summary: "Backend engineer, 8 years.".into(),
            skills: vec!["Rust".into(), "PostgreSQL".into()],
            ..Default::default()
        }
    }

    fn orchestrator() -> MatchOrchestrator {
        MatchOrchestrator::new(
            Storage::new(Arc::new(MemoryStorage::default())),
            EngineConfig::default(),
        )
    }

    #[test]
    fn test_match_request_is_deterministic() {
        let profile = profile();
        let first = build_match_request("We need Rust and Terraform.", &profile, &choice());
        let second = build_match_request("We need Rust and Terraform.", &profile, &choice());
        assert_eq!(first, second);
        // Byte-identical once serialized, which golden tests depend on.
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_match_request_embeds_job_and_resume() {
        let request = build_match_request("We need Rust.", &profile(), &choice());
        assert!(request.prompt.contains("We need Rust."));
        assert!(request.prompt.contains("Skills: Rust, PostgreSQL"));
        assert_eq!(request.temperature, 0.0);
        assert!(request.json_response);
    }

    #[test]
    fn test_resume_summary_sections_and_order() {
        let profile = ResumeProfile {
            summary: "Engineer.".into(),
            skills: vec!["Rust".into()],
            experience: vec![crate::models::resume::ExperienceEntry {
                title: "Staff Engineer".into(),
                company: "Acme".into(),
                dates: "".into(),
                description: "Led storage.".into(),
            }],
            ..Default::default()
        };
        let summary = resume_summary(&profile);
        assert_eq!(
            summary,
            "Summary: Engineer.\n\nSkills: Rust\n\nRole: Staff Engineer at Acme (N/A)\nDetails: Led storage."
        );
    }

    #[test]
    fn test_truncate_chars_respects_codepoints() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("ab", 10), "ab");
    }

    #[test]
    fn test_strip_json_fences_with_json_tag() {
        let input = "```json\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_without_tag() {
        let input = "```\n{\"key\": \"value\"}\n```";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_strip_json_fences_no_fences() {
        let input = "{\"key\": \"value\"}";
        assert_eq!(strip_json_fences(input), "{\"key\": \"value\"}");
    }

    #[test]
    fn test_parse_report_partial_payload_degrades() {
        let report = parse_report(r#"{"score": 40}"#).unwrap();
        assert_eq!(report.score, 40);
        assert!(report.matched_skills.is_empty());
    }

    #[test]
    fn test_parse_report_garbage_is_malformed() {
        let err = parse_report("Sorry, I cannot help with that.").unwrap_err();
        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_analyze_happy_path_increments_usage_once() {
        let orch = orchestrator();
        let provider = MockProvider::ok(REPORT_JSON);

        let report = orch
            .analyze(&provider, "We need Rust.", Some(&profile()), &choice())
            .await
            .unwrap();

        assert_eq!(report.score, 72);
        assert_eq!(provider.call_count(), 1);
        assert_eq!(orch.usage().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_analyze_failure_leaves_usage_unchanged() {
        let orch = orchestrator();
        let provider = MockProvider::failing(500);

        let err = orch
            .analyze(&provider, "We need Rust.", Some(&profile()), &choice())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::ProviderUnavailable(_)));
        assert_eq!(orch.usage().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_analyze_malformed_response_charges_nothing() {
        let orch = orchestrator();
        let provider = MockProvider::ok("not json at all");

        let err = orch
            .analyze(&provider, "We need Rust.", Some(&profile()), &choice())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::MalformedResponse(_)));
        assert_eq!(orch.usage().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_ceiling_refuses_before_any_provider_call() {
        let storage = Storage::new(Arc::new(MemoryStorage::default()));
        let config = EngineConfig {
            usage_ceiling: 5,
            ..Default::default()
        };
        storage.write(StorageKey::UsageCounter, &5u32).await.unwrap();
        let orch = MatchOrchestrator::new(storage, config);
        let provider = MockProvider::ok(REPORT_JSON);

        let err = orch
            .analyze(&provider, "We need Rust.", Some(&profile()), &choice())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::CreditExhausted { used: 5, ceiling: 5 }
        ));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_profile_is_no_active_resume() {
        let orch = orchestrator();
        let provider = MockProvider::ok(REPORT_JSON);

        let err = orch
            .analyze(&provider, "We need Rust.", None, &choice())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::NoActiveResume));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_job_text_is_validation_error() {
        let orch = orchestrator();
        let provider = MockProvider::ok(REPORT_JSON);

        let err = orch
            .analyze(&provider, "   ", Some(&profile()), &choice())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Validation(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_extract_profile_parses_and_charges() {
        let orch = orchestrator();
        let provider = MockProvider::ok(
            r#"```json
            {"summary": "Engineer.", "skills": ["Rust"], "experience": [], "education": [], "projects": []}
            ```"#,
        );

        let profile = orch
            .extract_profile(&provider, "resume text here", &choice())
            .await
            .unwrap();

        assert_eq!(profile.skills, vec!["Rust"]);
        assert_eq!(orch.usage().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_usage_commit_rereads_stored_counter() {
        let storage = Storage::new(Arc::new(MemoryStorage::default()));
        let orch = MatchOrchestrator::new(storage.clone(), EngineConfig::default());
        let provider = MockProvider::ok(REPORT_JSON);

        // Simulate another event advancing the counter mid-flight by
        // pre-seeding a different value than the orchestrator last saw.
        storage.write(StorageKey::UsageCounter, &3u32).await.unwrap();

        orch.analyze(&provider, "We need Rust.", Some(&profile()), &choice())
            .await
            .unwrap();

        assert_eq!(orch.usage().await.unwrap(), 4);
    }
}
