//! The capture record store.
//!
//! [`RecordStore`] owns one SQLite connection for writes and keeps the FTS5 index
//! consistent with the `captures` table. Reads against a file-backed store use a
//! short-lived read-only connection so they see a committed snapshot and never
//! queue behind the writer lock.

pub mod purge;
pub mod search;
pub mod stats;
pub mod store;
pub mod types;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

pub use types::{CaptureRecord, CaptureTrigger, SearchResult, StoreStatus, TextSource};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The schema could not be opened or created. Fatal to the holder.
    #[error("cannot initialize store at {path}: {source}")]
    Initialization {
        path: String,
        #[source]
        source: BoxError,
    },

    /// An insert or purge was rejected by the storage medium.
    #[error("write failed ({context}): {source}")]
    Write {
        context: &'static str,
        #[source]
        source: BoxError,
    },

    /// A search or status read failed, including malformed FTS syntax.
    #[error("query failed ({context}): {source}")]
    Query {
        context: &'static str,
        #[source]
        source: BoxError,
    },
}

impl StoreError {
    fn write(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Write {
            context,
            source: source.into(),
        }
    }

    fn query(context: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Query {
            context,
            source: source.into(),
        }
    }
}

pub struct RecordStore {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl RecordStore {
    /// Open or create the store at `path`. The schema is committed before this returns.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let conn = crate::db::open_database(path)?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = crate::db::open_memory_database()?;
        Ok(Self {
            conn: Mutex::new(conn),
            db_path: None,
        })
    }

    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Append a record; returns the assigned id.
    pub fn insert(&self, record: &CaptureRecord) -> Result<i64, StoreError> {
        let mut conn = self.writer();
        let id = store::insert_capture(&mut conn, record)
            .map_err(|e| StoreError::write("insert capture", e))?;
        tracing::debug!(id, app = %record.app_name, len = record.text_length, "capture inserted");
        Ok(id)
    }

    /// Full-text search, newest first, at most `limit` results.
    pub fn search(
        &self,
        query: &str,
        limit: usize,
        app_name: Option<&str>,
    ) -> Result<Vec<SearchResult>, StoreError> {
        self.with_reader(|conn| search::search_captures(conn, query, limit, app_name))
            .map_err(|e| StoreError::query("search", e))
    }

    pub fn status(&self) -> Result<StoreStatus, StoreError> {
        self.with_reader(|conn| stats::store_status(conn, self.db_path.as_deref()))
            .map_err(|e| StoreError::query("status", e))
    }

    /// Delete every record captured strictly before `older_than`.
    pub fn purge(&self, older_than: DateTime<Utc>) -> Result<usize, StoreError> {
        let mut conn = self.writer();
        let deleted = purge::purge_older_than(&mut conn, &older_than)
            .map_err(|e| StoreError::write("purge", e))?;
        tracing::info!(deleted, cutoff = %older_than, "purged old captures");
        Ok(deleted)
    }

    /// Integrity and row-count report for `doctor`.
    pub fn health(&self) -> Result<crate::db::HealthReport, StoreError> {
        let conn = self.writer();
        crate::db::check_database_health(&conn).map_err(|e| StoreError::query("health check", e))
    }

    fn writer(&self) -> MutexGuard<'_, Connection> {
        // Transactions roll back on drop, so a poisoned connection is still consistent.
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_reader<T, E>(&self, f: impl FnOnce(&Connection) -> Result<T, E>) -> Result<T, E>
    where
        E: From<rusqlite::Error>,
    {
        match &self.db_path {
            Some(path) => {
                let conn = Connection::open_with_flags(
                    path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )?;
                conn.busy_timeout(crate::db::BUSY_TIMEOUT)?;
                f(&conn)
            }
            None => f(&self.writer()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::content_hash;
    use chrono::Duration;
    use tempfile::TempDir;

    fn record(text: &str, ts: DateTime<Utc>) -> CaptureRecord {
        CaptureRecord {
            id: None,
            timestamp: ts,
            app_name: "Safari".into(),
            window_title: Some("Docs".into()),
            bundle_id: Some("com.apple.Safari".into()),
            source: TextSource::Synthetic,
            trigger: CaptureTrigger::Manual,
            display_id: Some("main".into()),
            text_hash: content_hash(text),
            text_length: text.chars().count(),
            text_content: text.into(),
            inserted_at: None,
        }
    }

    #[test]
    fn file_backed_store_round_trip() {
        let tmp = TempDir::new().unwrap();
        let store = RecordStore::open(tmp.path().join("screenmem.db")).unwrap();
        store.insert(&record("invoice number 4832", Utc::now())).unwrap();

        let results = store.search("invoice", 10, None).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].app_name, "Safari");

        let status = store.status().unwrap();
        assert_eq!(status.record_count, 1);
        assert!(status.last_capture_at.is_some());
        assert!(status.database_bytes > 0);
    }

    #[test]
    fn reopening_keeps_existing_records() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("screenmem.db");
        {
            let store = RecordStore::open(&path).unwrap();
            store.insert(&record("persisted line", Utc::now())).unwrap();
        }
        let store = RecordStore::open(&path).unwrap();
        assert_eq!(store.status().unwrap().record_count, 1);
    }

    #[test]
    fn malformed_search_maps_to_query_error() {
        let store = RecordStore::open_in_memory().unwrap();
        let err = store.search("AND OR (", 10, None).unwrap_err();
        assert!(matches!(err, StoreError::Query { .. }), "got {err:?}");
    }

    #[test]
    fn status_io_failure_maps_to_query_error() {
        let tmp = TempDir::new().unwrap();
        let store = RecordStore {
            conn: Mutex::new(crate::db::open_memory_database().unwrap()),
            db_path: Some(tmp.path().join("missing.db")),
        };
        assert!(matches!(store.status(), Err(StoreError::Query { .. })));
    }

    #[test]
    fn purge_count_matches_status_delta() {
        let store = RecordStore::open_in_memory().unwrap();
        let now = Utc::now();
        for days in [10, 8, 3, 1, 0] {
            store
                .insert(&record(&format!("line {days}"), now - Duration::days(days)))
                .unwrap();
        }

        let before = store.status().unwrap().record_count;
        let deleted = store.purge(now - Duration::days(5)).unwrap();
        let after = store.status().unwrap().record_count;
        assert_eq!(deleted, 2);
        assert_eq!(after, before - deleted as u64);
    }
}
