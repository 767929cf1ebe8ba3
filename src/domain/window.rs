//! Time windows that bound an event export

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use std::fmt;

/// Date format the tracker API expects for `startDate` / `endDate`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format the tracker API expects for its last-updated filters
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

/// Time filter applied to every query of one export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// Events whose event date falls between the two dates
    Period { start: NaiveDate, end: NaiveDate },
    /// Records changed at or after the cutoff
    LastUpdated(DateTime<Utc>),
}

impl TimeWindow {
    /// Builds a period window
    pub fn period(start: NaiveDate, end: NaiveDate) -> Self {
        TimeWindow::Period { start, end }
    }

    /// Builds a last-updated window
    pub fn last_updated(cutoff: DateTime<Utc>) -> Self {
        TimeWindow::LastUpdated(cutoff)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::Period { start, end } => write!(
                f,
                "{}..{}",
                start.format(DATE_FORMAT),
                end.format(DATE_FORMAT)
            ),
            TimeWindow::LastUpdated(cutoff) => {
                write!(f, "lastUpdated>={}", format_timestamp(cutoff))
            }
        }
    }
}

/// Formats a date the way query parameters expect it
pub fn format_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Formats a timestamp the way query parameters expect it
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Parses a calendar date (`YYYY-MM-DD`)
pub fn parse_date(input: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|e| format!("Invalid date '{input}': {e}. Expected YYYY-MM-DD"))
}

/// Parses a last-updated cutoff
///
/// Accepts RFC 3339, a naive `YYYY-MM-DDTHH:MM:SS[.fff]` timestamp (taken as
/// UTC) or a bare date (midnight UTC).
pub fn parse_timestamp(input: &str) -> Result<DateTime<Utc>, String> {
    let input = input.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(ts.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, DATE_FORMAT) {
        return Ok(date.and_time(NaiveTime::MIN).and_utc());
    }

    Err(format!(
        "Invalid timestamp '{input}'. Expected RFC 3339, YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD"
    ))
}
