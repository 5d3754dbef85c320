use rusqlite::Connection;
use std::path::Path;

use super::types::{parse_timestamp, StoreStatus};

/// Count and newest timestamp, plus on-disk size.
///
/// `db_path` is used for the size calculation (main file plus its WAL); pass
/// `None` for in-memory databases.
pub fn store_status(conn: &Connection, db_path: Option<&Path>) -> anyhow::Result<StoreStatus> {
    let (count, last): (i64, Option<String>) = conn.query_row(
        "SELECT COUNT(*), MAX(timestamp) FROM captures",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let database_bytes = match db_path {
        Some(path) => on_disk_bytes(path)?,
        None => 0,
    };

    Ok(StoreStatus {
        record_count: count as u64,
        last_capture_at: last.as_deref().and_then(parse_timestamp),
        database_bytes,
    })
}

/// Size of the database file plus its `-wal` sidecar if present.
pub fn on_disk_bytes(path: &Path) -> std::io::Result<u64> {
    let main = std::fs::metadata(path)?.len();
    let mut wal_path = path.as_os_str().to_owned();
    wal_path.push("-wal");
    let wal = std::fs::metadata(Path::new(&wal_path))
        .map(|m| m.len())
        .unwrap_or(0);
    Ok(main + wal)
}
