//! CLI `doctor` command: database diagnostics, permissions and capture tooling.

use anyhow::{Context, Result};

use screenmem::config::{DataPaths, ScreenMemConfig};
use screenmem::probe::Probes;

pub fn doctor(paths: &DataPaths, config: &ScreenMemConfig) -> Result<()> {
    println!("screenmem Health Report");
    println!("=======================");
    println!();

    if paths.db_path.exists() {
        let file_size = std::fs::metadata(&paths.db_path).map(|m| m.len()).unwrap_or(0);
        let store = super::open_store(paths).context("failed to open database (may be corrupt)")?;
        let report = store.health().context("failed to run health check")?;

        println!("Database:          {}", paths.db_path.display());
        println!("File size:         {}", super::format_bytes(file_size));
        println!("Schema version:    {}", report.schema_version);
        println!("Journal mode:      {}", report.journal_mode);
        println!("Captures:          {}", report.capture_count);
        println!("Indexed rows:      {}", report.fts_row_count);
        if report.integrity_ok {
            println!("Integrity check:   PASSED");
        } else {
            println!("Integrity check:   FAILED ({})", report.integrity_details);
            println!();
            println!("Recovery steps:");
            println!("  1. Stop the daemon.");
            println!("  2. Move {} aside; a fresh store is created on next start.", paths.db_path.display());
        }
    } else {
        println!("Database:          not found at {}", paths.db_path.display());
        println!("Run `screenmem capture-once` or `screenmem daemon` to initialize.");
    }
    println!();

    let probes = super::system_probes(config);
    let perms = probes.permissions();
    println!("Permissions:");
    println!("  Accessibility:   {}", super::granted(perms.accessibility_granted));
    println!("  Screen capture:  {}", super::granted(perms.screen_recording_granted));
    if !perms.accessibility_granted {
        println!("  Set capture.accessibility_command in {} to enable text extraction.", paths.config_path.display());
    }
    println!();

    let frames = super::frame_store(paths, config);
    let frame_count = frames.entries().map(|e| e.len()).unwrap_or(0);
    println!("Frame buffer:");
    println!("  Enabled:         {}", config.frames.enabled);
    println!("  Directory:       {}", paths.frames_dir.display());
    println!("  Frames on disk:  {frame_count} (max {})", config.frames.max_frames);

    Ok(())
}
