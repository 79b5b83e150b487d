//! Structured output of a resume/job match analysis.

use serde::{Deserialize, Serialize};

/// Match result parsed from the AI provider's JSON payload.
///
/// Every field defaults, so a well-formed payload missing expected fields
/// degrades to a partial report instead of failing the whole analysis.
/// Completely unparsable payloads are rejected at the orchestrator boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    /// 0–100 fit score.
    #[serde(default)]
    pub score: u32,
    /// One-sentence explanation of the score.
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub matched_skills: Vec<String>,
    /// Required skills the candidate truly lacks, deal-breakers first.
    #[serde(default)]
    pub missing_skills: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
}
