// Resume/job matching: model selection, prompt shaping, usage accounting and
// response parsing. All provider calls go through the `provider` module — no
// direct HTTP here.

pub mod orchestrator;
pub mod prompts;
pub mod selector;

pub use orchestrator::MatchOrchestrator;
pub use selector::{select_model, AiSettings, AiVendor, ModelChoice};
