use rusqlite::{params, Connection, Row};

use super::types::{parse_timestamp, CaptureTrigger, SearchResult, TextSource, UNKNOWN_APP};

/// Ranked FTS5 match over `text_content`, newest first.
///
/// `limit` is trusted: callers clamp it before reaching the store. An FTS5
/// syntax error in `query` comes back as the underlying SQLite error.
pub fn search_captures(
    conn: &Connection,
    query: &str,
    limit: usize,
    app_name: Option<&str>,
) -> rusqlite::Result<Vec<SearchResult>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, c.timestamp, c.app_name, c.window_title, c.bundle_id, \
                c.text_source, c.capture_trigger, \
                snippet(captures_fts, 0, '[', ']', ' ... ', 16) \
         FROM captures_fts \
         JOIN captures c ON c.id = captures_fts.rowid \
         WHERE captures_fts MATCH ?1 \
           AND (?2 IS NULL OR c.app_name = ?2) \
         ORDER BY c.timestamp DESC, bm25(captures_fts) \
         LIMIT ?3",
    )?;

    let results = stmt
        .query_map(params![query, app_name, limit as i64], row_to_result)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(results)
}

fn row_to_result(row: &Row<'_>) -> rusqlite::Result<SearchResult> {
    let raw_ts: String = row.get(1)?;
    let timestamp = parse_timestamp(&raw_ts).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            rusqlite::types::Type::Text,
            format!("invalid timestamp: {raw_ts}").into(),
        )
    })?;

    let app_name: Option<String> = row.get(2)?;
    let source: String = row.get(5)?;
    let trigger: String = row.get(6)?;

    Ok(SearchResult {
        id: row.get(0)?,
        timestamp,
        app_name: app_name.unwrap_or_else(|| UNKNOWN_APP.to_string()),
        window_title: row.get(3)?,
        bundle_id: row.get(4)?,
        source: source.parse().unwrap_or(TextSource::Accessibility),
        trigger: trigger.parse().unwrap_or(CaptureTrigger::Manual),
        snippet: row.get::<_, Option<String>>(7)?.unwrap_or_default(),
    })
}
