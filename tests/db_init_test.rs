use rusqlite::Connection;
use screenmem::db;
use tempfile::TempDir;

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type IN ('table', 'index', 'trigger') ORDER BY name")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<Vec<String>, _>>()
        .unwrap()
}

#[test]
fn fresh_directory_gets_full_schema() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("nested").join("screenmem.db")).unwrap();
    let names = table_names(&conn);

    for expected in [
        "captures",
        "captures_fts",
        "idx_captures_timestamp",
        "idx_captures_app_name",
        "idx_captures_source",
        "captures_ai",
        "captures_ad",
        "captures_au",
        "schema_meta",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }
}

#[test]
fn file_database_uses_wal_and_full_sync() {
    let tmp = TempDir::new().unwrap();
    let conn = db::open_database(tmp.path().join("screenmem.db")).unwrap();

    let mode: String = conn.pragma_query_value(None, "journal_mode", |r| r.get(0)).unwrap();
    let sync: i64 = conn.pragma_query_value(None, "synchronous", |r| r.get(0)).unwrap();
    assert_eq!(mode.to_lowercase(), "wal");
    assert_eq!(sync, 2);
}

#[test]
fn reopening_is_idempotent_and_healthy() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("screenmem.db");
    drop(db::open_database(&path).unwrap());
    let conn = db::open_database(&path).unwrap();

    let report = db::check_database_health(&conn).unwrap();
    assert_eq!(report.schema_version, db::schema::CURRENT_SCHEMA_VERSION);
    assert!(report.integrity_ok, "{}", report.integrity_details);
    assert_eq!(report.capture_count, 0);
}
