//! POSIX-second timestamps, rendered in JSON as `YYYYMMDD-HHMMSS` UTC
//! strings.

use chrono::{NaiveDateTime, TimeZone, Utc};

use crate::error::{ParaduxError, ParaduxResult};

const FORMAT: &str = "%Y%m%d-%H%M%S";

/// Formats a POSIX-second timestamp as `YYYYMMDD-HHMMSS` in UTC.
pub fn format_timestamp(posix_seconds: i64) -> String {
    Utc.timestamp_opt(posix_seconds, 0)
        .single()
        .expect("timestamp out of range")
        .format(FORMAT)
        .to_string()
}

/// Parses a `YYYYMMDD-HHMMSS` UTC string back into POSIX seconds.
pub fn parse_timestamp(s: &str) -> ParaduxResult<i64> {
    let naive = NaiveDateTime::parse_from_str(s, FORMAT)
        .map_err(|e| ParaduxError::SchemaViolation(format!("bad timestamp {s:?}: {e}")))?;
    Ok(Utc.from_utc_datetime(&naive).timestamp())
}

/// The current POSIX-second timestamp.
pub fn now() -> i64 {
    Utc::now().timestamp()
}
