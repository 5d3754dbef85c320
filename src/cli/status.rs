use anyhow::Result;

use screenmem::config::{DataPaths, ScreenMemConfig};
use screenmem::probe::Probes;
use screenmem::records::types::format_timestamp;

/// Print record count, last capture, database size and permissions.
pub fn status(paths: &DataPaths, config: &ScreenMemConfig) -> Result<()> {
    let store = super::open_store(paths)?;
    let status = store.status()?;
    let perms = super::system_probes(config).permissions();

    println!("Data directory:    {}", paths.base_dir.display());
    println!("Database:          {}", paths.db_path.display());
    println!("Records:           {}", status.record_count);
    match status.last_capture_at {
        Some(ts) => println!("Last capture:      {}", format_timestamp(&ts)),
        None => println!("Last capture:      none"),
    }
    println!("Database size:     {}", super::format_bytes(status.database_bytes));
    println!("Accessibility:     {}", super::granted(perms.accessibility_granted));
    println!("Screen recording:  {}", super::granted(perms.screen_recording_granted));

    Ok(())
}
