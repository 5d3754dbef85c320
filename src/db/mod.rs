pub mod schema;

use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

use crate::records::StoreError;

/// How long a reader or writer waits on a locked database before giving up.
pub const BUSY_TIMEOUT: Duration = Duration::from_millis(5000);

/// Open (or create) the capture database at the given path with pragmas set and
/// schema initialized.
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection, StoreError> {
    let path = path.as_ref();
    let init_err = |source: Box<dyn std::error::Error + Send + Sync>| StoreError::Initialization {
        path: path.display().to_string(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| init_err(e.into()))?;
    }

    let conn = Connection::open(path).map_err(|e| init_err(e.into()))?;

    // WAL lets a query server read while the daemon writes.
    let journal_mode: String = conn
        .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
        .map_err(|e| init_err(e.into()))?;
    conn.pragma_update(None, "synchronous", "FULL")
        .map_err(|e| init_err(e.into()))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| init_err(e.into()))?;

    schema::init_schema(&conn).map_err(|e| init_err(e.into()))?;

    tracing::info!(path = %path.display(), journal_mode = %journal_mode, "database initialized");
    Ok(conn)
}

/// Open an in-memory database with the schema applied.
pub fn open_memory_database() -> Result<Connection, StoreError> {
    let init_err = |e: rusqlite::Error| StoreError::Initialization {
        path: ":memory:".into(),
        source: e.into(),
    };
    let conn = Connection::open_in_memory().map_err(init_err)?;
    schema::init_schema(&conn).map_err(init_err)?;
    Ok(conn)
}

/// Result of [`check_database_health`].
#[derive(Debug)]
pub struct HealthReport {
    pub schema_version: u32,
    pub journal_mode: String,
    pub capture_count: u64,
    pub fts_row_count: u64,
    pub integrity_ok: bool,
    pub integrity_details: String,
}

/// Run `PRAGMA integrity_check` and gather row counts for `doctor`.
pub fn check_database_health(conn: &Connection) -> rusqlite::Result<HealthReport> {
    let schema_version = schema::get_schema_version(conn)?;
    let journal_mode: String = conn.pragma_query_value(None, "journal_mode", |row| row.get(0))?;
    let capture_count: i64 = conn.query_row("SELECT COUNT(*) FROM captures", [], |row| row.get(0))?;
    let fts_row_count: i64 =
        conn.query_row("SELECT COUNT(*) FROM captures_fts", [], |row| row.get(0))?;

    let integrity: Vec<String> = conn
        .prepare("PRAGMA integrity_check")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    let integrity_ok = integrity.len() == 1 && integrity[0] == "ok";

    Ok(HealthReport {
        schema_version,
        journal_mode,
        capture_count: capture_count as u64,
        fts_row_count: fts_row_count as u64,
        integrity_ok,
        integrity_details: integrity.join("; "),
    })
}
