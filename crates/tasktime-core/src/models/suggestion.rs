use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::datetime::flexible;
use super::task::Priority;

/// A candidate time window for working on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSuggestion {
    #[serde(with = "flexible")]
    pub start: DateTime<FixedOffset>,
    #[serde(with = "flexible")]
    pub end: DateTime<FixedOffset>,
    /// Roughly 0..1, higher is better. Not clamped.
    pub score: f64,
    #[serde(default)]
    pub reason: String,
}

impl TimeSuggestion {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Two suggestions cover the same window when start and end coincide.
    pub fn same_window(&self, other: &TimeSuggestion) -> bool {
        self.start == other.start && self.end == other.end
    }
}

/// One entry of the remote `/suggestions` resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRecord {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub suggested_times: Vec<TimeSuggestion>,
}

impl SuggestionRecord {
    pub fn has_category(&self, category: &str) -> bool {
        self.category
            .as_deref()
            .is_some_and(|c| c.trim().eq_ignore_ascii_case(category.trim()))
    }

    pub fn has_priority(&self, priority: Priority) -> bool {
        self.priority
            .as_deref()
            .is_some_and(|p| p.trim().eq_ignore_ascii_case(priority.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRequest {
    pub title: String,
    pub category: String,
    pub priority: Priority,
    pub estimated_duration_minutes: u32,
}

impl SuggestionRequest {
    pub fn new(
        title: impl Into<String>,
        category: impl Into<String>,
        priority: Priority,
        estimated_duration_minutes: u32,
    ) -> Self {
        Self {
            title: title.into(),
            category: category.into(),
            priority,
            estimated_duration_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_record_with_naive_times() {
        let record: SuggestionRecord = serde_json::from_value(json!({
            "category": "Trabalho",
            "suggested_times": [{
                "start": "2026-10-19T09:00:00",
                "end": "2026-10-19T10:30:00",
                "score": 0.82,
                "reason": "Manhã livre"
            }]
        }))
        .expect("parse");

        assert!(record.has_category("trabalho"));
        assert!(!record.has_priority(Priority::High));
        assert_eq!(record.suggested_times[0].duration_minutes(), 90);
    }

    #[test]
    fn test_same_window_compares_instants() {
        let a: TimeSuggestion = serde_json::from_value(json!({
            "start": "2026-10-19T12:00:00Z", "end": "2026-10-19T13:00:00Z", "score": 0.5
        }))
        .expect("parse");
        let b: TimeSuggestion = serde_json::from_value(json!({
            "start": "2026-10-19T09:00:00-03:00", "end": "2026-10-19T10:00:00-03:00", "score": 0.9
        }))
        .expect("parse");
        assert!(a.same_window(&b));
    }
}
