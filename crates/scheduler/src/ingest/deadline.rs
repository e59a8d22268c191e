//! Parsing of the `lastDate` deadline field

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Largest instant (ms) a JavaScript `Date` can represent, in either direction
const MAX_INSTANT_MS: f64 = 8.64e15;

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Parse a deadline into epoch milliseconds
///
/// Accepts epoch-millisecond numbers, RFC 3339 and RFC 2822 date-times,
/// bare `YYYY-MM-DD` dates (UTC midnight) and offset-less date-times
/// (interpreted as UTC). Anything else, including `null`, is `None`.
pub fn parse_deadline(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => {
            let ms = n.as_f64()?;
            (ms.is_finite() && ms.abs() <= MAX_INSTANT_MS).then(|| ms.trunc() as i64)
        }
        Value::String(s) => parse_deadline_str(s),
        _ => None,
    }
}

fn parse_deadline_str(s: &str) -> Option<i64> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.timestamp_millis());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc().timestamp_millis());
    }

    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|dt| dt.and_utc().timestamp_millis())
}
