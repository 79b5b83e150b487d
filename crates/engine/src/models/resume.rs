//! Resume data model — stored entries and the structured profile extracted
//! from them. Field names serialize snake_case to stay compatible with the
//! extension's persisted storage schema.

use serde::{Deserialize, Serialize};

/// A stored resume: opaque document payload plus an optional structured
/// extraction. Owned exclusively by the [`ResumeStore`](crate::resume::ResumeStore) —
/// created on import, mutated only to attach/replace its profile, destroyed
/// on explicit deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeEntry {
    pub id: String,
    pub name: String,
    /// Base64 data URI of the original document (e.g. `data:application/pdf;base64,...`).
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<ResumeProfile>,
}

/// Structured extraction of a resume. List order is preserved — it is
/// meaningful for rendering and for deterministic matching.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_info: Option<PersonalInfo>,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<ExperienceEntry>,
    #[serde(default)]
    pub education: Vec<EducationEntry>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub certifications: Vec<CertificationEntry>,
}

impl ResumeProfile {
    /// True when the extraction produced nothing a matcher could use.
    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty()
            && self.skills.is_empty()
            && self.experience.is_empty()
            && self.education.is_empty()
            && self.projects.is_empty()
            && self.certifications.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linkedin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperienceEntry {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub dates: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EducationEntry {
    #[serde(default)]
    pub school: String,
    #[serde(default)]
    pub degree: String,
    #[serde(default)]
    pub dates: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectEntry {
    #[serde(default)]
    pub name: String,
    /// Free text; extractors sometimes return a list, so joining happens at
    /// extraction time and this stays a plain string.
    #[serde(default)]
    pub technologies: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificationEntry {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub issuer: String,
    #[serde(default)]
    pub date: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_deserializes_from_extractor_json() {
        let json = r#"{
            "personal_info": {"name": "Ada Lovelace", "email": "ada@example.com"},
            "summary": "Systems engineer with a decade of distributed-systems work.",
            "skills": ["Rust", "Kubernetes", "PostgreSQL"],
            "experience": [
                {"title": "Staff Engineer", "company": "Acme", "dates": "2019 - 2024",
                 "description": "Led the storage team."}
            ],
            "education": [{"school": "MIT", "degree": "BSc CS", "dates": "2015"}],
            "projects": [{"name": "charmql", "technologies": "Rust, SQL", "description": "Query planner."}],
            "certifications": [{"name": "CKA", "issuer": "CNCF", "date": "2022"}]
        }"#;

        let profile: ResumeProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.skills, vec!["Rust", "Kubernetes", "PostgreSQL"]);
        assert_eq!(profile.experience[0].company, "Acme");
        assert_eq!(
            profile.personal_info.as_ref().unwrap().name.as_deref(),
            Some("Ada Lovelace")
        );
        assert!(!profile.is_empty());
    }

    #[test]
    fn test_profile_missing_sections_default_to_empty() {
        let profile: ResumeProfile = serde_json::from_str(r#"{"summary": "hi"}"#).unwrap();
        assert!(profile.skills.is_empty());
        assert!(profile.certifications.is_empty());
        assert!(profile.personal_info.is_none());
    }

    #[test]
    fn test_empty_profile_is_empty() {
        assert!(ResumeProfile::default().is_empty());
    }

    #[test]
    fn test_entry_without_profile_omits_field() {
        let entry = ResumeEntry {
            id: "r1".into(),
            name: "resume.pdf".into(),
            data: "data:application/pdf;base64,AAAA".into(),
            profile: None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("profile"));
    }
}
