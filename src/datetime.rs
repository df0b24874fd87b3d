//! Date/time helpers for API output.

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};

/// Convert a stored timestamp to RFC 3339 in UTC.
///
/// SQLite `datetime('now')` values (`YYYY-MM-DD HH:MM:SS`) are taken as UTC.
/// Values that already parse as RFC 3339 are normalized to `Z`.
/// Anything else is returned unchanged.
pub fn to_rfc3339(datetime_str: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(datetime_str) {
        return dt
            .with_timezone(&Utc)
            .to_rfc3339_opts(SecondsFormat::Secs, true);
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(datetime_str, "%Y-%m-%d %H:%M:%S") {
        return naive
            .and_utc()
            .to_rfc3339_opts(SecondsFormat::Secs, true);
    }

    datetime_str.to_string()
}

/// Same as [`to_rfc3339`] for optional columns.
pub fn to_rfc3339_opt(datetime_str: Option<&str>) -> Option<String> {
    datetime_str.map(to_rfc3339)
}
