use anyhow::Result;
use chrono::{Duration, Utc};

use screenmem::config::DataPaths;
use screenmem::records::types::cutoff_before;

/// Delete records older than `older_than` (e.g. `14d`).
pub fn purge(paths: &DataPaths, older_than: &str) -> Result<()> {
    let days = super::parse_days(older_than)?;
    let cutoff = cutoff_before(Utc::now(), Duration::days(i64::from(days)));

    let store = super::open_store(paths)?;
    let deleted = store.purge(cutoff)?;

    println!("Deleted {deleted} records older than {days}d");
    Ok(())
}
