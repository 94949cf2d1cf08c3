//! Data models for tasks and time suggestions.
//!
//! - `Task` (internal shape) and `TaskRecord` (wire shape)
//! - `NewTask`, `TaskPatch`: inputs to create/update
//! - `TimeSuggestion`, `SuggestionRecord`, `SuggestionRequest`

pub mod datetime;
pub mod suggestion;
pub mod task;

pub use suggestion::{SuggestionRecord, SuggestionRequest, TimeSuggestion};
pub use task::{NewTask, Priority, Task, TaskPatch, TaskRecord, TaskStatus};
