//! Age-based deletion.
//!
//! Rows are removed inside one transaction; the `captures_ad` trigger drops each
//! row's FTS5 entry as part of the same statement.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Connection};

use super::types::{format_timestamp, stored_precision};

/// Delete every capture with `timestamp < older_than`. Returns the number removed.
pub fn purge_older_than(conn: &mut Connection, older_than: &DateTime<Utc>) -> rusqlite::Result<usize> {
    let tx = conn.transaction()?;
    let deleted = tx.execute(
        "DELETE FROM captures WHERE timestamp < ?1",
        params![format_timestamp(&round_up_to_stored(*older_than))],
    )?;
    tx.commit()?;
    Ok(deleted)
}

/// Stored timestamps are whole microseconds, so `ts < cutoff` holds exactly
/// when `ts` is below the cutoff rounded up to the next microsecond.
fn round_up_to_stored(cutoff: DateTime<Utc>) -> DateTime<Utc> {
    let floor = stored_precision(cutoff);
    if floor == cutoff {
        return floor;
    }
    floor
        .checked_add_signed(Duration::microseconds(1))
        .unwrap_or(floor)
}
