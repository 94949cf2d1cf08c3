//! Ranked time-window suggestions for a task.
//!
//! The engine merges server-side suggestions with a deterministic synthetic
//! generator and never fails: a dead server simply means synthetic results.

pub mod engine;
pub mod synthetic;

pub use engine::{SuggestionEngine, FALLBACK_RESULT_TTL, MAX_SUGGESTIONS, RESULT_TTL};
