use std::cmp::Ordering;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use serde_json::Value;
use tracing::{debug, warn};

use super::synthetic;
use crate::api::request::Request;
use crate::api::{ApiError, CachingClient};
use crate::models::{SuggestionRecord, SuggestionRequest, TimeSuggestion};

/// Results are capped at this many windows.
pub const MAX_SUGGESTIONS: usize = 6;
/// Below this many server matches, further sources are consulted.
const MIN_MATCHES: usize = 4;
/// Lifetime of a computed result per (category, priority, duration).
pub const RESULT_TTL: Duration = Duration::from_secs(10 * 60);
/// Lifetime of a synthetic-only result produced because the server failed,
/// so recovered server data shows up quickly.
pub const FALLBACK_RESULT_TTL: Duration = Duration::from_secs(60);
/// Used when the caller gives no estimate.
const DEFAULT_DURATION_MINUTES: u32 = 60;

const SUGGESTIONS_PATH: &str = "/suggestions";

pub struct SuggestionEngine {
    client: CachingClient,
    tz: FixedOffset,
}

impl SuggestionEngine {
    /// Engine generating synthetic windows in the machine's current offset.
    pub fn new(client: CachingClient) -> Self {
        Self::with_offset(client, *Local::now().offset())
    }

    pub fn with_offset(client: CachingClient, tz: FixedOffset) -> Self {
        Self { client, tz }
    }

    /// Ranked windows for `request`, best first, at most [`MAX_SUGGESTIONS`].
    ///
    /// Empty only when title or category is blank.
    pub async fn suggest(&self, request: &SuggestionRequest) -> Vec<TimeSuggestion> {
        if request.title.trim().is_empty() || request.category.trim().is_empty() {
            return Vec::new();
        }

        let cache = self.client.cache();
        let key = result_key(request);
        if let Some(cached) = cache.get_as::<Vec<TimeSuggestion>>(&key) {
            debug!(key = %key, "Suggestion cache hit");
            return cached;
        }

        let now = Utc
            .timestamp_millis_opt(cache.now_ms())
            .single()
            .unwrap_or_else(Utc::now);

        let (results, ttl) = match self.fetch_records().await {
            Ok(records) => (self.merge(&records, request, now), RESULT_TTL),
            Err(e) => {
                warn!(error = %e, "Suggestions unavailable, using synthetic windows");
                (self.synthetic(request, now), FALLBACK_RESULT_TTL)
            }
        };

        match serde_json::to_value(&results) {
            Ok(value) => cache.set_with_ttl(&key, value, ttl),
            Err(e) => warn!(error = %e, "Could not cache suggestions"),
        }
        results
    }

    async fn fetch_records(&self) -> Result<Vec<SuggestionRecord>, ApiError> {
        let response = self.client.execute(Request::get(SUGGESTIONS_PATH)).await?;
        parse_records(response.data)
    }

    fn synthetic(&self, request: &SuggestionRequest, now: DateTime<Utc>) -> Vec<TimeSuggestion> {
        synthetic::generate(
            request.priority,
            duration_of(request),
            now,
            self.tz,
            MAX_SUGGESTIONS,
        )
    }

    /// Category matches first, then priority matches, then synthetic padding,
    /// skipping any window already present.
    fn merge(
        &self,
        records: &[SuggestionRecord],
        request: &SuggestionRequest,
        now: DateTime<Utc>,
    ) -> Vec<TimeSuggestion> {
        let mut picked: Vec<TimeSuggestion> = records
            .iter()
            .filter(|r| r.has_category(&request.category))
            .flat_map(|r| r.suggested_times.iter().cloned())
            .collect();
        debug!(matches = picked.len(), category = %request.category, "Category suggestions");

        if picked.len() < MIN_MATCHES {
            let by_priority = records
                .iter()
                .filter(|r| r.has_priority(request.priority))
                .flat_map(|r| r.suggested_times.iter());
            for candidate in by_priority {
                push_unique(&mut picked, candidate.clone());
            }
        }

        if picked.len() < MIN_MATCHES {
            for candidate in self.synthetic(request, now) {
                if picked.len() >= MAX_SUGGESTIONS {
                    break;
                }
                push_unique(&mut picked, candidate);
            }
        }

        rank(picked)
    }
}

fn push_unique(list: &mut Vec<TimeSuggestion>, candidate: TimeSuggestion) {
    if !list.iter().any(|s| s.same_window(&candidate)) {
        list.push(candidate);
    }
}

/// Sort by descending score and cap.
fn rank(mut list: Vec<TimeSuggestion>) -> Vec<TimeSuggestion> {
    list.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    list.truncate(MAX_SUGGESTIONS);
    list
}

fn duration_of(request: &SuggestionRequest) -> u32 {
    match request.estimated_duration_minutes {
        0 => DEFAULT_DURATION_MINUTES,
        minutes => minutes,
    }
}

fn result_key(request: &SuggestionRequest) -> String {
    format!(
        "suggestions:{}:{}:{}",
        request.category.trim().to_lowercase(),
        request.priority,
        duration_of(request)
    )
}

/// Accept either a bare list or `{"suggestions": [...]}`. Malformed records
/// are skipped; a payload of any other shape is an error.
fn parse_records(data: Value) -> Result<Vec<SuggestionRecord>, ApiError> {
    let items = match data {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("suggestions") {
            Some(Value::Array(items)) => items,
            _ => return Err(ApiError::Decode("suggestions payload has no list".to_string())),
        },
        other => {
            return Err(ApiError::Decode(format!(
                "unexpected suggestions payload: {}",
                other
            )))
        }
    };

    Ok(items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                debug!(error = %e, "Skipping malformed suggestion record");
                None
            }
        })
        .collect())
}
