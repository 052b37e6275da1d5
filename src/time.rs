//! Time-of-day parsing and interval overlap.
//!
//! Slot boundaries arrive as strings in whatever shape the data source used:
//! `"08:00"`, `"08:00:00"` or `"08:00 AM"`. Parsing never fails loudly; an
//! unknown format simply yields `None`, and an interval that cannot be parsed
//! never overlaps anything.
//!
//! All comparisons are same-day clock comparisons. A slot whose end is earlier
//! than its start (an overnight slot such as `22:45-01:15`) is compared
//! literally and is not wrapped past midnight.

use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ValidationError;

/// Accepted time-of-day formats, tried in order.
const TIME_FORMATS: [&str; 3] = ["%H:%M", "%H:%M:%S", "%I:%M %p"];

/// Calendar date format for slot dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A wall-clock time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Creates a time of day from hour and minute.
    #[must_use]
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Returns the underlying chrono time.
    #[must_use]
    pub const fn as_naive(&self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

/// Parses a time of day, trying `HH:MM`, `HH:MM:SS` and `hh:MM AM/PM`.
///
/// # Examples
///
/// ```
/// use theatrekb::time::{parse_time_of_day, TimeOfDay};
///
/// assert_eq!(parse_time_of_day("14:30"), TimeOfDay::from_hm(14, 30));
/// assert_eq!(parse_time_of_day("02:30 PM"), TimeOfDay::from_hm(14, 30));
/// assert_eq!(parse_time_of_day("half past two"), None);
/// ```
#[must_use]
pub fn parse_time_of_day(text: &str) -> Option<TimeOfDay> {
    let text = text.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
        .map(TimeOfDay)
}

/// A time value that no supported format accepts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparsable time of day: '{value}'")]
pub struct InvalidTimeOfDay {
    /// The raw value.
    pub value: String,
}

/// A parsed `[start, end)` clock interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockInterval {
    /// Start (inclusive).
    pub start: TimeOfDay,
    /// End (exclusive).
    pub end: TimeOfDay,
}

impl ClockInterval {
    /// Parses both bounds.
    ///
    /// # Errors
    ///
    /// Returns the first bound (start before end) that cannot be parsed.
    pub fn parse(start: &str, end: &str) -> Result<Self, InvalidTimeOfDay> {
        let parse = |value: &str| {
            parse_time_of_day(value).ok_or_else(|| InvalidTimeOfDay {
                value: value.to_string(),
            })
        };
        Ok(Self {
            start: parse(start)?,
            end: parse(end)?,
        })
    }

    /// Half-open overlap: `self.start < other.end && other.start < self.end`.
    ///
    /// Touching bounds do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Returns true if the end is before the start on the same-day clock.
    #[must_use]
    pub fn is_overnight(&self) -> bool {
        self.end < self.start
    }
}

/// String-level overlap test used by callers that hold raw slot values.
///
/// Returns false when any bound cannot be parsed.
///
/// # Examples
///
/// ```
/// use theatrekb::time::overlaps;
///
/// assert!(overlaps("08:00", "10:30", "10:00", "12:30"));
/// assert!(!overlaps("09:00", "10:00", "10:00", "11:00"));
/// assert!(!overlaps("09:00", "??", "09:30", "10:00"));
/// ```
#[must_use]
pub fn overlaps(start_a: &str, end_a: &str, start_b: &str, end_b: &str) -> bool {
    match (
        ClockInterval::parse(start_a, end_a),
        ClockInterval::parse(start_b, end_b),
    ) {
        (Ok(a), Ok(b)) => a.overlaps(&b),
        _ => false,
    }
}

/// Validates a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns `ValidationError::InvalidDate` if the value is not a real date in that format.
pub fn validate_date(text: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> TimeOfDay {
        TimeOfDay::from_hm(h, m).unwrap()
    }

    #[test]
    fn test_parse_formats() {
        assert_eq!(parse_time_of_day("08:00"), Some(hm(8, 0)));
        assert_eq!(parse_time_of_day("08:00:00"), Some(hm(8, 0)));
        assert_eq!(parse_time_of_day(" 10:45 "), Some(hm(10, 45)));
        assert_eq!(parse_time_of_day("10:45 AM"), Some(hm(10, 45)));
        assert_eq!(parse_time_of_day("12:15 AM"), Some(hm(0, 15)));
        assert_eq!(parse_time_of_day("07:05 PM"), Some(hm(19, 5)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_time_of_day(""), None);
        assert_eq!(parse_time_of_day("25:00"), None);
        assert_eq!(parse_time_of_day("noon"), None);
        assert_eq!(parse_time_of_day("2025-12-26"), None);
    }

    #[test]
    fn test_seconds_are_kept() {
        let t = parse_time_of_day("09:59:30").unwrap();
        assert!(t > hm(9, 59));
        assert!(t < hm(10, 0));
    }

    #[test]
    fn test_overlap_positive() {
        assert!(overlaps("08:00", "10:30", "10:00", "12:30"));
    }

    #[test]
    fn test_touching_bounds_do_not_overlap() {
        assert!(!overlaps("09:00", "10:00", "10:00", "11:00"));
        assert!(!overlaps("10:00", "11:00", "09:00", "10:00"));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let slots = [
            ("08:00", "10:30"),
            ("10:00", "12:30"),
            ("10:45", "13:15"),
            ("22:45", "01:15"),
            ("09:00:00", "09:30:00"),
            ("09:15 AM", "11:00 AM"),
            ("bad", "10:00"),
        ];
        for a in &slots {
            for b in &slots {
                assert_eq!(
                    overlaps(a.0, a.1, b.0, b.1),
                    overlaps(b.0, b.1, a.0, a.1),
                    "asymmetric for {a:?} vs {b:?}"
                );
            }
        }
    }

    #[test]
    fn test_mixed_formats_overlap() {
        assert!(overlaps("09:15 AM", "11:00 AM", "10:00", "10:30:00"));
        assert!(!overlaps("01:00 PM", "02:00 PM", "11:00", "13:00"));
    }

    #[test]
    fn test_unparsable_never_overlaps() {
        assert!(!overlaps("08:00", "later", "08:00", "10:00"));
        assert!(matches!(
            ClockInterval::parse("8am", "10:00"),
            Err(InvalidTimeOfDay { value }) if value == "8am"
        ));
    }

    #[test]
    fn test_overnight_is_literal() {
        let night = ClockInterval::parse("22:45", "01:15").unwrap();
        assert!(night.is_overnight());
        let late = ClockInterval::parse("23:00", "23:30").unwrap();
        // Same-day comparison: 23:00 < 01:15 is false, so no overlap.
        assert!(!night.overlaps(&late));
        let evening = ClockInterval::parse("19:30", "22:00").unwrap();
        assert!(!night.overlaps(&evening));
    }

    #[test]
    fn test_validate_date() {
        assert!(validate_date("2025-12-26").is_ok());
        assert!(validate_date("2025-02-30").is_err());
        assert!(validate_date("26/12/2025").is_err());
    }
}
