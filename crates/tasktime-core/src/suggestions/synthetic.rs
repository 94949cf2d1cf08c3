//! Deterministic fallback windows when the server has too little to offer.
//!
//! Each priority tier has three representative hours. Starting tomorrow and
//! stepping three days at a time, every sampled day contributes one window
//! per hour until enough candidates exist or the horizon is reached.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};

use crate::models::{Priority, TimeSuggestion};
use crate::utils::format::{day_period_label, format_weekday_date};

const DAY_STEP: i64 = 3;
const HORIZON_DAYS: i64 = 21;
const BASE_SCORE: f64 = 0.9;
/// Score lost per day further out than tomorrow.
const DAY_DECAY: f64 = 0.05;
/// Score lost per position within a day.
const SLOT_DECAY: f64 = 0.05;
const MIN_SCORE: f64 = 0.1;

/// Hours to propose, best first.
pub fn tier_hours(priority: Priority) -> [u32; 3] {
    match priority {
        Priority::High => [9, 14, 10],
        Priority::Medium => [14, 16, 19],
        Priority::Low => [19, 21, 16],
    }
}

fn priority_phrase(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "ideal para tarefas urgentes",
        Priority::Medium => "bom equilíbrio para tarefas importantes",
        Priority::Low => "momento tranquilo para tarefas leves",
    }
}

fn score_for(day_offset: i64, slot: usize) -> f64 {
    let raw = BASE_SCORE - DAY_DECAY * (day_offset - 1) as f64 - SLOT_DECAY * slot as f64;
    (raw.max(MIN_SCORE) * 100.0).round() / 100.0
}

/// Generate up to `limit` windows of `duration_minutes`, in `tz`, after `now`.
pub fn generate(
    priority: Priority,
    duration_minutes: u32,
    now: DateTime<Utc>,
    tz: FixedOffset,
    limit: usize,
) -> Vec<TimeSuggestion> {
    let today = now.with_timezone(&tz).date_naive();
    let length = Duration::minutes(i64::from(duration_minutes));
    let mut out = Vec::with_capacity(limit);

    let mut day_offset = 1;
    while day_offset <= HORIZON_DAYS && out.len() < limit {
        let day = today + Duration::days(day_offset);
        for (slot, &hour) in tier_hours(priority).iter().enumerate() {
            if out.len() >= limit {
                break;
            }
            let Some(start) = day
                .and_hms_opt(hour, 0, 0)
                .and_then(|naive| tz.from_local_datetime(&naive).single())
            else {
                continue;
            };
            out.push(TimeSuggestion {
                start,
                end: start + length,
                score: score_for(day_offset, slot),
                reason: format!(
                    "{} · {} · {}",
                    day_period_label(&start),
                    priority_phrase(priority),
                    format_weekday_date(&start)
                ),
            });
        }
        day_offset += DAY_STEP;
    }
    out
}
