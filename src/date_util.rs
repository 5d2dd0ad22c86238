use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use serde_json::Value;

use crate::calendar::CalendarDay;

static RE_DAY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// Timestamps without an offset. These are read as UTC.
const NAIVE_TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// True when `s` has the exact `YYYY-MM-DD` layout (not necessarily a real date).
pub fn is_canonical_day(s: &str) -> bool {
    RE_DAY.is_match(s)
}

/// Reduce a date-like JSON value to its UTC calendar day.
///
/// Accepts:
/// - `"2024-01-05"`: taken verbatim (must still be a real date)
/// - `"2024-01-05T23:30:00-02:00"`: RFC 3339, converted to UTC first
/// - `"2024-01-05T10:00:00"` / `"2024-01-05 10:00:00"`: read as UTC
/// - `1704412800000`: epoch milliseconds
///
/// Anything else yields `None`.
pub fn canonicalize_date(value: &Value) -> Option<CalendarDay> {
    match value {
        Value::String(s) => parse_day_str(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(day_from_epoch_millis),
        _ => None,
    }
}

fn parse_day_str(s: &str) -> Option<CalendarDay> {
    if is_canonical_day(s) {
        return s.parse().ok();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return CalendarDay::new(dt.with_timezone(&Utc).date_naive());
    }
    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(|dt| CalendarDay::new(dt.date()))
}

fn day_from_epoch_millis(ms: i64) -> Option<CalendarDay> {
    DateTime::from_timestamp_millis(ms).and_then(|dt| CalendarDay::new(dt.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn d(y: i32, m: u32, day: u32) -> CalendarDay {
        CalendarDay::from_ymd(y, m, day).unwrap()
    }

    #[test]
    fn test_is_canonical_day() {
        assert!(is_canonical_day("2025-01-31"));
        assert!(!is_canonical_day("2025-1-31"));
        assert!(!is_canonical_day("2025-01-31T00:00:00Z"));
        assert!(!is_canonical_day(" 2025-01-31"));
    }

    #[test]
    fn test_verbatim_day() {
        assert_eq!(canonicalize_date(&json!("2024-01-05")), Some(d(2024, 1, 5)));
        assert_eq!(canonicalize_date(&json!(" 2024-01-05 ")), Some(d(2024, 1, 5)));
        assert_eq!(canonicalize_date(&json!("2024-13-05")), None);
    }

    #[test]
    fn test_rfc3339_uses_utc_day() {
        // 23:30 at -02:00 is 01:30 the next day in UTC
        assert_eq!(
            canonicalize_date(&json!("2024-01-05T23:30:00-02:00")),
            Some(d(2024, 1, 6))
        );
        assert_eq!(
            canonicalize_date(&json!("2024-01-05T00:30:00+05:00")),
            Some(d(2024, 1, 4))
        );
        assert_eq!(canonicalize_date(&json!("2024-01-05T12:00:00Z")), Some(d(2024, 1, 5)));
    }

    #[test]
    fn test_naive_timestamp_read_as_utc() {
        assert_eq!(canonicalize_date(&json!("2024-01-05T23:59:59")), Some(d(2024, 1, 5)));
        assert_eq!(canonicalize_date(&json!("2024-01-05 08:00:00.250")), Some(d(2024, 1, 5)));
    }

    #[test]
    fn test_epoch_millis() {
        // 2024-01-05T00:00:00Z
        assert_eq!(canonicalize_date(&json!(1_704_412_800_000i64)), Some(d(2024, 1, 5)));
    }

    #[test]
    fn test_garbage_rejected() {
        assert_eq!(canonicalize_date(&json!("yesterday")), None);
        assert_eq!(canonicalize_date(&json!(null)), None);
        assert_eq!(canonicalize_date(&json!({"date": "2024-01-05"})), None);
        assert_eq!(canonicalize_date(&json!(true)), None);
    }
}
