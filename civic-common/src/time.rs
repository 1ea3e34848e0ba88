//! Timestamp utilities

use chrono::{DateTime, NaiveDateTime, SecondsFormat, SubsecRound, Utc};

use crate::{Error, Result};

/// Current UTC timestamp, truncated to the microsecond storage precision
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Format a timestamp for TEXT storage columns.
///
/// Fixed-width RFC 3339 (UTC, microseconds, `Z` suffix) so that
/// lexicographic `ORDER BY` matches chronological order.
pub fn to_storage_string(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp back into UTC.
///
/// Accepts RFC 3339 and, for `timestamp without time zone` columns served by
/// hosted Postgres, a naive `YYYY-MM-DDTHH:MM:SS[.f]` which is taken as UTC.
pub fn parse_storage_string(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| Error::Internal(format!("Failed to parse timestamp '{}': {}", value, e)))
}
