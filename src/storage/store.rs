use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OpenFlags};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::config::StoreConfig;
use crate::metrics;
use crate::storage::data::{
    check_storable, format_timestamp, parse_timestamp, truncate_to_seconds, Record, StorageError,
    StorageResult,
};

/// One table for every entity. The entity id is only ever a bound parameter.
const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS records (
    sequence  INTEGER PRIMARY KEY AUTOINCREMENT,
    entity_id TEXT    NOT NULL,
    value     INTEGER NOT NULL,
    timestamp TEXT    NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_records_entity_ts
    ON records (entity_id, timestamp, sequence);
";

const INSERT_SQL: &str = "INSERT INTO records (entity_id, value, timestamp) VALUES (?1, ?2, ?3)";

const RANGE_SQL: &str = "
SELECT sequence, value, timestamp
FROM records
WHERE entity_id = ?1 AND timestamp BETWEEN ?2 AND ?3
ORDER BY timestamp ASC, sequence ASC
";

const SUM_SQL: &str = "
SELECT COALESCE(SUM(value), 0)
FROM records
WHERE entity_id = ?1 AND timestamp BETWEEN ?2 AND ?3
";

/// Append-only, per-entity record storage backed by a single SQLite file.
///
/// The store holds no connection. Every operation opens its own connection
/// on the blocking pool and drops it before returning, on success and on
/// error alike. Cloning the store is cheap and clones share the same file.
#[derive(Debug, Clone)]
pub struct TimeSeriesStore {
    config: StoreConfig,
}

impl TimeSeriesStore {
    /// Opens (creating if needed) the database file and its schema
    pub async fn open(config: StoreConfig) -> StorageResult<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let store = Self { config };
        let mode = store
            .with_connection("open", |conn| {
                conn.execute_batch(SCHEMA_SQL)?;
                let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
                    row.get(0)
                })?;
                Ok(mode)
            })
            .await?;

        info!(path = %store.config.path.display(), journal_mode = %mode, "Opened time-series store");
        Ok(store)
    }

    /// Returns the database file in use
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    /// Appends one record to an entity, creating the entity implicitly.
    /// Timestamps outside years 0000-9999 are rejected.
    pub async fn append(
        &self,
        entity_id: &str,
        value: i64,
        timestamp: NaiveDateTime,
    ) -> StorageResult<()> {
        let entity = entity_id.to_string();
        let timestamp = format_timestamp(&check_storable(truncate_to_seconds(timestamp))?);

        let sequence = self
            .with_connection("append", move |conn| {
                conn.execute(INSERT_SQL, params![entity, value, timestamp])?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        metrics::record_append(value);
        debug!(entity_id, sequence, value, "Appended record");
        Ok(())
    }

    /// Returns every entity that currently holds at least one record
    pub async fn list_entities(&self) -> StorageResult<BTreeSet<String>> {
        let started = Instant::now();
        let entities = self
            .with_connection("list_entities", |conn| {
                let mut stmt = conn.prepare("SELECT DISTINCT entity_id FROM records")?;
                let entities = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<BTreeSet<_>, _>>()?;
                Ok(entities)
            })
            .await?;

        metrics::record_query("list_entities", elapsed_ms(started));
        Ok(entities)
    }

    /// Returns the entity's records with `start <= timestamp <= end`, ordered
    /// by timestamp and then sequence. Unknown entities yield an empty list.
    pub async fn read_range(
        &self,
        entity_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StorageResult<Vec<Record>> {
        let started = Instant::now();
        let entity = entity_id.to_string();
        let (start, end) = bound_texts(start, end)?;

        let rows = self
            .with_connection("read_range", move |conn| {
                let mut stmt = conn.prepare(RANGE_SQL)?;
                let rows = stmt
                    .query_map(params![entity, start, end], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, i64>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await?;

        let records = rows
            .into_iter()
            .map(|(sequence, value, raw)| match parse_timestamp(&raw) {
                Some(timestamp) => Ok(Record::new(sequence, value, timestamp)),
                None => Err(StorageError::CorruptTimestamp { sequence, raw }),
            })
            .collect::<StorageResult<Vec<_>>>()?;

        metrics::record_query("read_range", elapsed_ms(started));
        debug!(entity_id, records = records.len(), "Read range");
        Ok(records)
    }

    /// Sums the entity's values over `start <= timestamp <= end`.
    /// An empty range or an unknown entity sums to zero. A total that does
    /// not fit in an `i64` is [`StorageError::SumOverflow`].
    pub async fn sum_range(
        &self,
        entity_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> StorageResult<i64> {
        let started = Instant::now();
        let entity = entity_id.to_string();
        let (start, end) = bound_texts(start, end)?;

        let sum = self
            .with_connection("sum_range", move |conn| {
                conn.query_row(SUM_SQL, params![entity, start, end], |row| row.get::<_, i64>(0))
                    .map_err(|e| match e {
                        rusqlite::Error::SqliteFailure(_, Some(ref msg)) if msg == "integer overflow" => {
                            StorageError::SumOverflow { entity_id: entity.clone() }
                        }
                        other => StorageError::Database(other),
                    })
            })
            .await?;

        metrics::record_query("sum_range", elapsed_ms(started));
        Ok(sum)
    }

    /// Total number of records held for an entity
    pub async fn count_records(&self, entity_id: &str) -> StorageResult<u64> {
        let entity = entity_id.to_string();
        let count: i64 = self
            .with_connection("count_records", move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM records WHERE entity_id = ?1",
                    params![entity],
                    |row| row.get(0),
                )?;
                Ok(count)
            })
            .await?;
        Ok(count.max(0) as u64)
    }

    /// Runs `op` against a fresh connection on the blocking pool. The
    /// connection is closed when the closure returns.
    async fn with_connection<T, F>(&self, operation: &'static str, op: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StorageResult<T> + Send + 'static,
    {
        let config = self.config.clone();
        let result = tokio::task::spawn_blocking(move || {
            let conn = Connection::open_with_flags(
                &config.path,
                OpenFlags::SQLITE_OPEN_READ_WRITE
                    | OpenFlags::SQLITE_OPEN_CREATE
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )?;
            conn.busy_timeout(config.busy_timeout())?;
            op(&conn)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))
        .and_then(|result| result);

        if let Err(e) = &result {
            metrics::record_storage_error(operation);
            error!(operation, error = %e, "Storage operation failed");
        }
        result
    }
}

fn bound_texts(start: NaiveDateTime, end: NaiveDateTime) -> StorageResult<(String, String)> {
    Ok((
        format_timestamp(&check_storable(start)?),
        format_timestamp(&check_storable(end)?),
    ))
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}
