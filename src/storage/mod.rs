//! Storage module for tallydb
//! Handles durable, append-only record storage and range retrieval.

pub mod data;
pub mod store;

pub use data::{Record, StorageError, StorageResult, TIMESTAMP_FORMAT};
pub use store::TimeSeriesStore;
