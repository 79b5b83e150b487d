//! Browser-independent coordination core for a job-application assistant:
//! resume state, job-page auto-scan detection and AI match analysis.
//!
//! The host (a side panel, a service worker bridge, a test harness) injects a
//! [`storage::StorageAdapter`] and drives [`engine::Engine`] with tab events;
//! everything else — debouncing, credit accounting, provider selection,
//! response parsing — happens in here, free of any browser API.

pub mod config;
pub mod engine;
pub mod errors;
pub mod matching;
pub mod models;
pub mod provider;
pub mod resume;
pub mod sanitize;
pub mod scan;
pub mod storage;

pub use config::EngineConfig;
pub use engine::Engine;
pub use errors::EngineError;
pub use matching::{select_model, AiSettings, AiVendor, ModelChoice};
pub use models::analysis::MatchReport;
pub use models::resume::{
    CertificationEntry, EducationEntry, ExperienceEntry, PersonalInfo, ProjectEntry, ResumeEntry,
    ResumeProfile,
};
pub use models::scan::AutoScanRequest;
pub use sanitize::sanitize;
