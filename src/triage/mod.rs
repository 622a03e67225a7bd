//! Email triage — classify each inbound message as `no`, `email`,
//! `notify`, or `question`.
//!
//! Flow per message:
//! 1. `RulesEngine::evaluate()` — fast pattern matching (no LLM)
//! 2. Prompt assembly — profile fields + message substituted into the template
//! 3. Reasoning call — structured JSON decision, strictly parsed
//!
//! A decision that cannot be parsed is an error, never a default.

pub mod decider;
pub mod prompt;
pub mod rules;
pub mod types;

pub use decider::TriageDecider;
pub use rules::RulesEngine;
pub use types::{TriageResponse, TriageResult};
