use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use thiserror::Error;

use crate::storage::data::format_timestamp;

/// Day-month-year layout accepted from callers
pub const DATE_FORMAT: &str = "%d.%m.%Y";
/// Time-of-day layout accepted from callers
pub const TIME_FORMAT: &str = "%H:%M:%S";

pub const DAY_START: &str = "00:00:00";
pub const DAY_END: &str = "23:59:59";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateParseError {
    #[error("Invalid date {input:?}, expected DD.MM.YYYY")]
    InvalidDate { input: String },
    #[error("Invalid time {input:?}, expected HH:MM:SS")]
    InvalidTime { input: String },
}

/// An inclusive `[start, end]` pair of date-times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBounds {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl RangeBounds {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Canonical `YYYY-MM-DD HH:MM:SS` form of the start bound
    pub fn start_text(&self) -> String {
        format_timestamp(&self.start)
    }

    /// Canonical `YYYY-MM-DD HH:MM:SS` form of the end bound
    pub fn end_text(&self) -> String {
        format_timestamp(&self.end)
    }

    /// An inverted range is accepted but matches nothing
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }
}

/// Resolves caller-entered dates and times into canonical range bounds.
///
/// Does not check that start precedes end.
pub fn resolve_date_range(
    start_date: &str,
    end_date: &str,
    start_time: &str,
    end_time: &str,
) -> Result<RangeBounds, DateParseError> {
    let start = parse_date(start_date)?.and_time(parse_time(start_time)?);
    let end = parse_date(end_date)?.and_time(parse_time(end_time)?);
    Ok(RangeBounds::new(start, end))
}

/// Resolves two dates into a range covering both days in full
pub fn resolve_full_days(start_date: &str, end_date: &str) -> Result<RangeBounds, DateParseError> {
    resolve_date_range(start_date, end_date, DAY_START, DAY_END)
}

/// First day of `today`'s month through the end of `today`
pub fn current_month_range(today: NaiveDate) -> RangeBounds {
    let first = today.with_day(1).unwrap_or(today);
    RangeBounds::new(
        first.and_time(NaiveTime::default()),
        today.and_time(end_of_day()),
    )
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::default())
}

/// Parses `DD.MM.YYYY`, rejecting any other shape before handing the
/// calendar check to chrono.
pub fn parse_date(input: &str) -> Result<NaiveDate, DateParseError> {
    let invalid = || DateParseError::InvalidDate {
        input: input.to_string(),
    };
    if !has_shape(input, "dd.dd.dddd") {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(input, DATE_FORMAT).map_err(|_| invalid())
}

/// Parses `HH:MM:SS`. Leap seconds are rejected.
pub fn parse_time(input: &str) -> Result<NaiveTime, DateParseError> {
    let invalid = || DateParseError::InvalidTime {
        input: input.to_string(),
    };
    if !has_shape(input, "dd:dd:dd") {
        return Err(invalid());
    }
    let time = NaiveTime::parse_from_str(input, TIME_FORMAT).map_err(|_| invalid())?;
    if time.nanosecond() != 0 {
        return Err(invalid());
    }
    Ok(time)
}

/// `d` in the pattern matches an ASCII digit, anything else matches itself.
fn has_shape(input: &str, pattern: &str) -> bool {
    input.len() == pattern.len()
        && input
            .bytes()
            .zip(pattern.bytes())
            .all(|(c, p)| if p == b'd' { c.is_ascii_digit() } else { c == p })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_full_days() {
        let bounds = resolve_full_days("01.01.2024", "31.01.2024").unwrap();
        assert_eq!(bounds.start_text(), "2024-01-01 00:00:00");
        assert_eq!(bounds.end_text(), "2024-01-31 23:59:59");
        assert!(!bounds.is_inverted());
    }

    #[test]
    fn test_resolve_with_times() {
        let bounds = resolve_date_range("05.03.2024", "06.03.2024", "08:30:00", "17:45:10").unwrap();
        assert_eq!(bounds.start_text(), "2024-03-05 08:30:00");
        assert_eq!(bounds.end_text(), "2024-03-06 17:45:10");
    }

    #[test]
    fn test_leap_years_and_month_boundaries() {
        assert!(resolve_full_days("29.02.2024", "29.02.2024").is_ok());
        assert!(resolve_full_days("28.02.2023", "01.03.2023").is_ok());
        assert!(resolve_full_days("30.04.2024", "31.12.2024").is_ok());
        assert!(resolve_full_days("29.02.2000", "29.02.2000").is_ok());

        assert!(matches!(
            resolve_full_days("29.02.2023", "01.03.2023"),
            Err(DateParseError::InvalidDate { .. })
        ));
        assert!(matches!(
            resolve_full_days("01.01.2024", "31.04.2024"),
            Err(DateParseError::InvalidDate { .. })
        ));
        assert!(matches!(
            resolve_full_days("29.02.1900", "01.03.1900"),
            Err(DateParseError::InvalidDate { .. })
        ));
    }

    #[test]
    fn test_rejects_malformed_dates() {
        for bad in [
            "",
            "2024-01-01",
            "1.1.2024",
            "01/01/2024",
            "01.01.24",
            " 01.01.2024",
            "01.01.2024 ",
            "32.01.2024",
            "00.01.2024",
            "01.13.2024",
            "aa.bb.cccc",
            "01.01.+024",
        ] {
            assert_eq!(
                resolve_full_days(bad, "31.01.2024"),
                Err(DateParseError::InvalidDate {
                    input: bad.to_string()
                }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_malformed_times() {
        for bad in ["", "24:00:00", "9:00:00", "09:00", "09:60:00", "23:59:60", "09-00-00"] {
            assert_eq!(
                resolve_date_range("01.01.2024", "31.01.2024", bad, DAY_END),
                Err(DateParseError::InvalidTime {
                    input: bad.to_string()
                }),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_inverted_range_is_not_an_error() {
        let bounds = resolve_full_days("31.01.2024", "01.01.2024").unwrap();
        assert!(bounds.is_inverted());
    }

    #[test]
    fn test_current_month_range() {
        let today = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let bounds = current_month_range(today);
        assert_eq!(bounds.start_text(), "2024-02-01 00:00:00");
        assert_eq!(bounds.end_text(), "2024-02-29 23:59:59");

        let first = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let bounds = current_month_range(first);
        assert_eq!(bounds.start_text(), "2024-03-01 00:00:00");
        assert_eq!(bounds.end_text(), "2024-03-01 23:59:59");
    }
}
