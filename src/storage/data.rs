use chrono::{Datelike, NaiveDateTime, Timelike};
use std::io;
use std::ops::RangeInclusive;
use thiserror::Error;

/// Text layout of every persisted timestamp. Lexicographic order of this
/// layout matches chronological order, which the range queries rely on.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Years that render as exactly four digits in `TIMESTAMP_FORMAT`
pub const STORABLE_YEARS: RangeInclusive<i32> = 0..=9999;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Storage task failed: {0}")]
    Task(String),
    #[error("Corrupt timestamp {raw:?} in record {sequence}")]
    CorruptTimestamp { sequence: i64, raw: String },
    #[error("Timestamp {timestamp} is outside years 0000-9999")]
    TimestampOutOfRange { timestamp: NaiveDateTime },
    #[error("Sum for entity {entity_id:?} overflows a 64-bit integer")]
    SumOverflow { entity_id: String },
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A single immutable observation belonging to one entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Store-assigned, strictly increasing sequence number
    sequence: i64,
    /// The recorded value
    value: i64,
    /// When the value was observed, at second precision
    timestamp: NaiveDateTime,
}

impl Record {
    /// Creates a new Record
    pub fn new(sequence: i64, value: i64, timestamp: NaiveDateTime) -> Self {
        Self {
            sequence,
            value,
            timestamp: truncate_to_seconds(timestamp),
        }
    }

    /// Returns the sequence number
    pub fn sequence(&self) -> i64 {
        self.sequence
    }

    /// Returns the value
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Returns the timestamp
    pub fn timestamp(&self) -> NaiveDateTime {
        self.timestamp
    }
}

/// Drops any sub-second component.
pub fn truncate_to_seconds(timestamp: NaiveDateTime) -> NaiveDateTime {
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}

/// Renders a timestamp in the persisted layout.
pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(TIMESTAMP_FORMAT).to_string()
}

/// Rejects timestamps whose text form would not sort chronologically.
pub fn check_storable(timestamp: NaiveDateTime) -> StorageResult<NaiveDateTime> {
    if STORABLE_YEARS.contains(&timestamp.year()) {
        Ok(timestamp)
    } else {
        Err(StorageError::TimestampOutOfRange { timestamp })
    }
}

/// Parses a timestamp in the persisted layout.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).ok()
}
