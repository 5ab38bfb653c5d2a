use thiserror::Error;

use crate::query::range::{resolve_full_days, DateParseError, RangeBounds};

/// Errors that can occur while parsing caller-entered text
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid value {0:?}: expected a whole number such as 12")]
    InvalidValue(String),
    #[error("Invalid range {0:?}: expected DD.MM.YYYY-DD.MM.YYYY")]
    InvalidRange(String),
    #[error(transparent)]
    Date(#[from] DateParseError),
}

/// Result type for parser operations
pub type ParserResult<T> = Result<T, ParseError>;

/// Parses a caller-entered value. Surrounding whitespace is ignored; the
/// rest must be an optionally signed base-10 integer that fits in an `i64`.
pub fn parse_value(text: &str) -> ParserResult<i64> {
    let trimmed = text.trim();
    let digits = trimmed.strip_prefix(['+', '-']).unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::InvalidValue(text.to_string()));
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| ParseError::InvalidValue(text.to_string()))
}

/// Parses `DD.MM.YYYY-DD.MM.YYYY` into full-day bounds
pub fn parse_range_text(text: &str) -> ParserResult<RangeBounds> {
    let trimmed = text.trim();
    let (start, end) = trimmed
        .split_once('-')
        .filter(|(_, end)| !end.contains('-'))
        .ok_or_else(|| ParseError::InvalidRange(text.to_string()))?;
    Ok(resolve_full_days(start.trim(), end.trim())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("12"), Ok(12));
        assert_eq!(parse_value(" 12\n"), Ok(12));
        assert_eq!(parse_value("-5"), Ok(-5));
        assert_eq!(parse_value("+7"), Ok(7));
        assert_eq!(parse_value("007"), Ok(7));
    }

    #[test]
    fn test_parse_value_rejects_non_integers() {
        for bad in ["", "   ", "abc", "12a", "1.5", "1e3", "--1", "+", "1 000", "٣"] {
            assert!(
                matches!(parse_value(bad), Err(ParseError::InvalidValue(_))),
                "{bad:?} should be rejected"
            );
        }
        assert!(matches!(
            parse_value("99999999999999999999"),
            Err(ParseError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_parse_range_text() {
        let bounds = parse_range_text("01.01.2024-31.01.2024").unwrap();
        assert_eq!(bounds.start_text(), "2024-01-01 00:00:00");
        assert_eq!(bounds.end_text(), "2024-01-31 23:59:59");

        let spaced = parse_range_text(" 01.02.2024 - 29.02.2024 ").unwrap();
        assert_eq!(spaced.end_text(), "2024-02-29 23:59:59");
    }

    #[test]
    fn test_parse_range_text_errors() {
        assert!(matches!(
            parse_range_text("01.01.2024"),
            Err(ParseError::InvalidRange(_))
        ));
        assert!(matches!(
            parse_range_text("2024-01-01-2024-01-31"),
            Err(ParseError::InvalidRange(_))
        ));
        assert!(matches!(
            parse_range_text("01.01.2024-31.02.2024"),
            Err(ParseError::Date(DateParseError::InvalidDate { .. }))
        ));
    }
}
