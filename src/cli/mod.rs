//! Operator commands behind the `screenmem` binary.

pub mod capture;
pub mod config;
pub mod doctor;
pub mod frames;
pub mod ingest;
pub mod purge;
pub mod search;
pub mod serve;
pub mod status;

use anyhow::{bail, Context, Result};
use std::sync::Arc;

use screenmem::config::{DataPaths, ScreenMemConfig};
use screenmem::frames::{screen, FrameRetentionStore, RetentionPolicy};
use screenmem::probe::SystemProbes;
use screenmem::records::RecordStore;

/// Open the record store in the data directory, creating it if needed.
fn open_store(paths: &DataPaths) -> Result<Arc<RecordStore>> {
    paths.ensure()?;
    let store = RecordStore::open(&paths.db_path)
        .with_context(|| format!("failed to open store at {}", paths.db_path.display()))?;
    Ok(Arc::new(store))
}

fn frame_store(paths: &DataPaths, config: &ScreenMemConfig) -> FrameRetentionStore {
    FrameRetentionStore::new(
        &paths.frames_dir,
        RetentionPolicy::from(&config.frames),
        screen::default_source(),
    )
}

fn system_probes(config: &ScreenMemConfig) -> SystemProbes {
    SystemProbes::new(screen::default_source(), config.capture.accessibility_command.clone())
}

/// `14`, `14d` or `14D` to a day count.
pub fn parse_days(raw: &str) -> Result<u32> {
    let trimmed = raw.trim();
    let digits = trimmed
        .strip_suffix('d')
        .or_else(|| trimmed.strip_suffix('D'))
        .unwrap_or(trimmed);
    match digits.parse::<u32>() {
        Ok(days) => Ok(days),
        Err(_) => bail!("invalid day value: {raw}"),
    }
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn granted(flag: bool) -> &'static str {
    if flag {
        "granted"
    } else {
        "denied"
    }
}
