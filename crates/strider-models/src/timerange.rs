//! Date codec for the bot's `--timerange` flag.
//!
//! The bot addresses candle history as `YYYYMMDD-YYYYMMDD` (end exclusive at
//! the daily boundary). Everything in the harness that touches dates goes
//! through this module so the wire format lives in exactly one place.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Compact date format used on the bot command line.
pub const DATE_FMT: &str = "%Y%m%d";

/// Formats a date as `YYYYMMDD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

/// Parses a `YYYYMMDD` date.
pub fn parse_date(s: &str) -> Result<NaiveDate, TimerangeError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FMT)
        .map_err(|_| TimerangeError::BadDate(s.trim().to_string()))
}

/// An inclusive start / end pair of calendar dates.
///
/// Invariant: `start <= end`, enforced at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timerange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Timerange {
    /// Creates a range, rejecting inverted bounds.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, TimerangeError> {
        if end < start {
            return Err(TimerangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of calendar days covered, counting both endpoints.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Human-readable `YYYY-MM-DD to YYYY-MM-DD` form for logs and reports.
    pub fn pretty(&self) -> String {
        format!(
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}

impl fmt::Display for Timerange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", format_date(self.start), format_date(self.end))
    }
}

impl FromStr for Timerange {
    type Err = TimerangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| TimerangeError::BadFormat(s.trim().to_string()))?;
        Timerange::new(parse_date(a)?, parse_date(b)?)
    }
}

/// Errors from the date codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimerangeError {
    /// Date did not parse as `YYYYMMDD`.
    #[error("invalid date (expected YYYYMMDD): {0:?}")]
    BadDate(String),

    /// End precedes start.
    #[error("timerange end {end} precedes start {start}")]
    Inverted { start: NaiveDate, end: NaiveDate },

    /// Missing the `-` separator.
    #[error("invalid timerange (expected YYYYMMDD-YYYYMMDD): {0:?}")]
    BadFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_date_codec_round_trip() {
        let date = d(2024, 3, 7);
        assert_eq!(format_date(date), "20240307");
        assert_eq!(parse_date("20240307").unwrap(), date);
    }

    #[test]
    fn test_timerange_display_and_parse() {
        let tr = Timerange::new(d(2024, 1, 1), d(2024, 2, 15)).unwrap();
        assert_eq!(tr.to_string(), "20240101-20240215");
        assert_eq!("20240101-20240215".parse::<Timerange>().unwrap(), tr);
    }

    #[test]
    fn test_inverted_range_rejected() {
        let err = Timerange::new(d(2024, 2, 1), d(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, TimerangeError::Inverted { .. }));
    }

    #[test]
    fn test_days_counts_both_endpoints() {
        let tr = Timerange::new(d(2024, 1, 1), d(2024, 1, 30)).unwrap();
        assert_eq!(tr.days(), 30);
    }

    #[test]
    fn test_bad_inputs() {
        assert!(parse_date("2024-01-01").is_err());
        assert!("20240101".parse::<Timerange>().is_err());
        assert!("abc-def".parse::<Timerange>().is_err());
    }
}
