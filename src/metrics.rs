//! Performance metrics collection for tallydb
//!
//! This module provides functionality for collecting and exposing store and
//! report metrics in Prometheus format.

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the metrics collection system
pub fn init_metrics(addr: SocketAddr) -> Result<(), Box<dyn std::error::Error>> {
    // Create a Prometheus exporter
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    Ok(())
}

/// Record an appended value
pub fn record_append(value: i64) {
    counter!("tallydb.store.appends").increment(1);
    histogram!("tallydb.store.append_value").record(value as f64);
}

/// Record a store query execution
pub fn record_query(kind: &'static str, duration_ms: f64) {
    histogram!("tallydb.store.query_duration_ms", "kind" => kind).record(duration_ms);
}

/// Record a failed store operation
pub fn record_storage_error(operation: &'static str) {
    counter!("tallydb.store.errors", "operation" => operation).increment(1);
}

/// Record a report run and how many entities it covered
pub fn record_report(report: &'static str, entities: usize) {
    counter!("tallydb.report.runs", "report" => report).increment(1);
    gauge!("tallydb.report.entities", "report" => report).set(entities as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter() {
        // With no recorder installed the macros are no-ops and must not panic
        record_append(42);
        record_query("read_range", 1.5);
        record_storage_error("append");
        record_report("sum_all_entities", 3);
    }
}
