//! Write path for capture records.
//!
//! [`insert_capture`] runs inside a transaction: the row insert fires the
//! `captures_ai` trigger, so the FTS5 entry is committed or rolled back together
//! with the row it indexes.

use chrono::Utc;
use rusqlite::{params, Connection};

use super::types::{format_timestamp, CaptureRecord};

/// Insert one record and return its store-assigned id.
pub fn insert_capture(conn: &mut Connection, record: &CaptureRecord) -> rusqlite::Result<i64> {
    let tx = conn.transaction()?;

    tx.execute(
        "INSERT INTO captures (timestamp, app_name, window_title, bundle_id, text_source, \
         capture_trigger, display_id, text_hash, text_length, text_content, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            format_timestamp(&record.timestamp),
            record.app_name,
            record.window_title,
            record.bundle_id,
            record.source.as_str(),
            record.trigger.as_str(),
            record.display_id,
            record.text_hash,
            record.text_length as i64,
            record.text_content,
            format_timestamp(&Utc::now()),
        ],
    )?;
    let id = tx.last_insert_rowid();

    tx.commit()?;
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::hashing::content_hash;
    use crate::records::types::{CaptureTrigger, TextSource};

    fn record(text: &str) -> CaptureRecord {
        CaptureRecord {
            id: None,
            timestamp: Utc::now(),
            app_name: "Safari".into(),
            window_title: Some("Invoice".into()),
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
    fn insert_assigns_increasing_ids() {
        let mut conn = db::open_memory_database().unwrap();
        let first = insert_capture(&mut conn, &record("first line")).unwrap();
        let second = insert_capture(&mut conn, &record("second line")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut conn = db::open_memory_database().unwrap();
        let first = insert_capture(&mut conn, &record("to be removed")).unwrap();
        conn.execute("DELETE FROM captures WHERE id = ?1", [first]).unwrap();
        let second = insert_capture(&mut conn, &record("replacement")).unwrap();
        assert!(second > first);
    }

    #[test]
    fn insert_is_visible_in_fts() {
        let mut conn = db::open_memory_database().unwrap();
        let id = insert_capture(&mut conn, &record("invoice number 4832")).unwrap();

        let fts_id: i64 = conn
            .query_row(
                "SELECT rowid FROM captures_fts WHERE captures_fts MATCH 'invoice'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(fts_id, id);
    }

    #[test]
    fn rejected_insert_leaves_no_index_entry() {
        let mut conn = db::open_memory_database().unwrap();
        conn.execute_batch(
            "CREATE TRIGGER reject_all BEFORE INSERT ON captures \
             WHEN new.app_name = 'Blocked' BEGIN SELECT RAISE(ABORT, 'blocked'); END;",
        )
        .unwrap();

        let mut blocked = record("should never be searchable");
        blocked.app_name = "Blocked".into();
        assert!(insert_capture(&mut conn, &blocked).is_err());

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM captures_fts WHERE captures_fts MATCH 'searchable'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 0);
    }
}
