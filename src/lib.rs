//! tallydb - an append-only, per-entity time-series store with reporting
//!
//! This crate provides durable integer records keyed by an opaque entity id,
//! plus per-entity sums and listings over inclusive date ranges.

pub mod config;
pub mod storage;
pub mod ingestion;
pub mod query;
pub mod metrics;
