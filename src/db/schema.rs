//! SQL DDL for the capture store.
//!
//! Defines the `captures` table with its timestamp/app/source indexes, the
//! external-content `captures_fts` (FTS5) table, the triggers that keep the two
//! in lockstep, and `schema_meta`. All DDL uses `IF NOT EXISTS` so opening an
//! existing data directory is a no-op.

use rusqlite::Connection;

/// The schema version written by this binary.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

const SCHEMA_SQL: &str = r#"
-- Captured text observations
CREATE TABLE IF NOT EXISTS captures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    app_name TEXT NOT NULL,
    window_title TEXT,
    bundle_id TEXT,
    text_source TEXT NOT NULL CHECK(text_source IN ('accessibility','ocr','synthetic')),
    capture_trigger TEXT NOT NULL,
    display_id TEXT,
    text_hash TEXT NOT NULL,
    text_length INTEGER NOT NULL,
    text_content TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_captures_timestamp ON captures(timestamp);
CREATE INDEX IF NOT EXISTS idx_captures_app_name ON captures(app_name);
CREATE INDEX IF NOT EXISTS idx_captures_source ON captures(text_source);

-- Full-text index over text_content (external content, rowid = captures.id)
CREATE VIRTUAL TABLE IF NOT EXISTS captures_fts USING fts5(
    text_content,
    content='captures',
    content_rowid='id'
);

-- Index maintenance runs inside the statement that touches `captures`
CREATE TRIGGER IF NOT EXISTS captures_ai AFTER INSERT ON captures BEGIN
    INSERT INTO captures_fts(rowid, text_content) VALUES (new.id, new.text_content);
END;

CREATE TRIGGER IF NOT EXISTS captures_ad AFTER DELETE ON captures BEGIN
    INSERT INTO captures_fts(captures_fts, rowid, text_content) VALUES ('delete', old.id, old.text_content);
END;

CREATE TRIGGER IF NOT EXISTS captures_au AFTER UPDATE ON captures BEGIN
    INSERT INTO captures_fts(captures_fts, rowid, text_content) VALUES ('delete', old.id, old.text_content);
    INSERT INTO captures_fts(rowid, text_content) VALUES (new.id, new.text_content);
END;

-- Schema metadata
CREATE TABLE IF NOT EXISTS schema_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
"#;

/// Initialize all schema objects in one transaction. Idempotent.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("BEGIN IMMEDIATE;")?;
    let result = conn.execute_batch(SCHEMA_SQL).and_then(|_| {
        conn.execute(
            "INSERT OR IGNORE INTO schema_meta (key, value) VALUES ('schema_version', ?1)",
            [CURRENT_SCHEMA_VERSION.to_string()],
        )
    });

    match result {
        Ok(_) => conn.execute_batch("COMMIT;"),
        Err(e) => {
            let _ = conn.execute_batch("ROLLBACK;");
            Err(e)
        }
    }
}

/// Read the stored schema version.
pub fn get_schema_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT value FROM schema_meta WHERE key = 'schema_version'",
        [],
        |row| {
            let val: String = row.get(0)?;
            Ok(val.parse::<u32>().unwrap_or(0))
        },
    )
}
