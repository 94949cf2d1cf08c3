//! Utility functions for date parsing and display formatting.

pub mod format;

pub use format::{day_period_label, format_weekday_date, parse_datetime, parse_datetime_utc};
