//! Audit timestamp codec.
//!
//! Audit columns are stored as TEXT with millisecond precision and an explicit
//! offset (`2024-05-01T08:30:00.125Z`). Reads accept any RFC 3339 offset and
//! normalize to UTC.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Returns the current UTC time truncated to stored precision.
pub fn now_millis() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Formats a timestamp for storage.
pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses a stored timestamp.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|parsed| parsed.with_timezone(&Utc))
}
