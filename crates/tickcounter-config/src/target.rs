//! Countdown target parsing.
//!
//! Two input shapes are accepted: the compact `YYYYMMDDHHMMSS` form that is
//! written back to the config file, and ordinary ISO-like local date-times
//! such as `2026-12-31T23:59` or `2026-12-31 23:59:30`. An RFC 3339 string
//! with an explicit offset is converted to local time.

use std::fmt;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

/// Compact storage format.
const COMPACT_FORMAT: &str = "%Y%m%d%H%M%S";

/// Local date-time layouts tried in order.
const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

/// Why a target string was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetParseError {
    /// Nothing recognizable as a date.
    Unrecognized(String),
    /// Shaped like a date but out of range (e.g. month 13).
    OutOfRange(String),
    /// Falls in a local-time gap (DST spring-forward).
    NonexistentLocalTime(String),
}

impl fmt::Display for TargetParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(s) => write!(f, "unrecognized date/time: {s:?}"),
            Self::OutOfRange(s) => write!(f, "date/time out of range: {s:?}"),
            Self::NonexistentLocalTime(s) => {
                write!(f, "date/time does not exist in the local time zone: {s:?}")
            }
        }
    }
}

impl std::error::Error for TargetParseError {}

/// Parse a caller-supplied target into a local instant.
pub fn parse_target(input: &str) -> Result<DateTime<Local>, TargetParseError> {
    let input = input.trim();

    if input.len() == 14 && input.bytes().all(|b| b.is_ascii_digit()) {
        let naive = NaiveDateTime::parse_from_str(input, COMPACT_FORMAT)
            .map_err(|_| TargetParseError::OutOfRange(input.to_string()))?;
        return to_local(naive, input);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Ok(dt.with_timezone(&Local));
    }

    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, format) {
            return to_local(naive, input);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        let naive = date
            .and_hms_opt(0, 0, 0)
            .ok_or_else(|| TargetParseError::OutOfRange(input.to_string()))?;
        return to_local(naive, input);
    }

    Err(TargetParseError::Unrecognized(input.to_string()))
}

/// Format an instant in the compact storage form.
pub fn format_compact(instant: &DateTime<Local>) -> String {
    instant.format(COMPACT_FORMAT).to_string()
}

fn to_local(naive: NaiveDateTime, input: &str) -> Result<DateTime<Local>, TargetParseError> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| TargetParseError::NonexistentLocalTime(input.to_string()))
}
