use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc, Weekday};

/// Parse a timestamp as sent by the API.
///
/// Accepts RFC 3339 (`2024-05-01T10:00:00-03:00`), naive date-times
/// (`2024-05-01T10:00:00`, `2024-05-01 10:00:00`, optional fraction) and bare
/// dates. Anything without an offset is taken as UTC.
pub fn parse_datetime(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    let utc = FixedOffset::east_opt(0)?;
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return utc.from_local_datetime(&naive).single();
        }
    }
    let date = NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()?;
    utc.from_local_datetime(&date.and_hms_opt(0, 0, 0)?).single()
}

/// Parse to UTC, see [`parse_datetime`].
pub fn parse_datetime_utc(s: &str) -> Option<DateTime<Utc>> {
    parse_datetime(s).map(|dt| dt.with_timezone(&Utc))
}

fn weekday_pt(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "segunda-feira",
        Weekday::Tue => "terça-feira",
        Weekday::Wed => "quarta-feira",
        Weekday::Thu => "quinta-feira",
        Weekday::Fri => "sexta-feira",
        Weekday::Sat => "sábado",
        Weekday::Sun => "domingo",
    }
}

/// `segunda-feira, 19/10`
pub fn format_weekday_date<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    format!("{}, {:02}/{:02}", weekday_pt(dt.weekday()), dt.day(), dt.month())
}

/// Time-of-day label for the hour a window starts in.
pub fn day_period_label<Tz: TimeZone>(dt: &DateTime<Tz>) -> &'static str {
    match dt.hour() {
        0..=11 => "Manhã",
        12..=17 => "Tarde",
        _ => "Noite",
    }
}
