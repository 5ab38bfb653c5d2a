use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::ingestion::parser::{parse_range_text, ParseError};
use crate::metrics;
use crate::query::directory::NameDirectory;
use crate::query::range::{self, DateParseError, RangeBounds};
use crate::storage::data::{Record, StorageError, StorageResult};
use crate::storage::store::TimeSeriesStore;

/// Error type for callers that resolve a range and query in one step
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Range(#[from] ParseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// One `(timestamp, value)` line of an entity report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportLine {
    #[serde(with = "timestamp_text")]
    pub timestamp: NaiveDateTime,
    pub value: i64,
}

impl From<Record> for ReportLine {
    fn from(record: Record) -> Self {
        Self {
            timestamp: record.timestamp(),
            value: record.value(),
        }
    }
}

/// One directory entry's part of the consolidated report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsolidatedSection {
    pub display_name: String,
    pub entity_id: String,
    pub lines: Vec<ReportLine>,
}

/// Builds sums and listings over the store.
///
/// Holds no state beyond the store handle and the injected directory;
/// every report re-queries the store.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    store: TimeSeriesStore,
    directory: NameDirectory,
}

impl ReportAggregator {
    pub fn new(store: TimeSeriesStore, directory: NameDirectory) -> Self {
        Self { store, directory }
    }

    pub fn store(&self) -> &TimeSeriesStore {
        &self.store
    }

    /// See [`range::resolve_date_range`]
    pub fn resolve_date_range(
        start_date: &str,
        end_date: &str,
        start_time: &str,
        end_time: &str,
    ) -> Result<RangeBounds, DateParseError> {
        range::resolve_date_range(start_date, end_date, start_time, end_time)
    }

    /// Per-entity sums over every entity in the catalog, zero sums included.
    ///
    /// Entities are enumerated once and then summed one by one; an entity
    /// created in between is simply not part of this report.
    pub async fn sum_all_entities(&self, bounds: &RangeBounds) -> StorageResult<BTreeMap<String, i64>> {
        let entities = self.store.list_entities().await?;

        let mut sums = BTreeMap::new();
        for entity_id in entities {
            let sum = self.store.sum_range(&entity_id, bounds.start, bounds.end).await?;
            sums.insert(entity_id, sum);
        }

        metrics::record_report("sum_all_entities", sums.len());
        info!(
            start = %bounds.start_text(),
            end = %bounds.end_text(),
            inverted = bounds.is_inverted(),
            entities = sums.len(),
            "Computed sums for all entities"
        );
        Ok(sums)
    }

    /// Every record of one entity in range, one line per record
    pub async fn entity_report(&self, entity_id: &str, bounds: &RangeBounds) -> StorageResult<Vec<ReportLine>> {
        let lines: Vec<ReportLine> = self
            .store
            .read_range(entity_id, bounds.start, bounds.end)
            .await?
            .into_iter()
            .map(ReportLine::from)
            .collect();

        metrics::record_report("entity_report", 1);
        debug!(entity_id, lines = lines.len(), "Built entity report");
        Ok(lines)
    }

    /// Entity reports for every directory entry, in directory order
    pub async fn consolidated_report(&self, bounds: &RangeBounds) -> StorageResult<Vec<ConsolidatedSection>> {
        let mut sections = Vec::with_capacity(self.directory.len());
        for entry in self.directory.iter() {
            let lines = self.entity_report(&entry.entity_id, bounds).await?;
            sections.push(ConsolidatedSection {
                display_name: entry.display_name.clone(),
                entity_id: entry.entity_id.clone(),
                lines,
            });
        }

        metrics::record_report("consolidated_report", sections.len());
        info!(
            start = %bounds.start_text(),
            end = %bounds.end_text(),
            inverted = bounds.is_inverted(),
            sections = sections.len(),
            "Built consolidated report"
        );
        Ok(sections)
    }

    /// Sums every entity over a `DD.MM.YYYY-DD.MM.YYYY` range, both days in full
    pub async fn sum_all_entities_in(&self, range_text: &str) -> Result<BTreeMap<String, i64>, ReportError> {
        let bounds = parse_range_text(range_text)?;
        Ok(self.sum_all_entities(&bounds).await?)
    }
}

mod timestamp_text {
    use chrono::NaiveDateTime;
    use serde::Serializer;

    use crate::storage::data::format_timestamp;

    pub fn serialize<S: Serializer>(timestamp: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(timestamp))
    }
}
