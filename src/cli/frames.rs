use anyhow::Result;
use chrono::{DateTime, Utc};

use screenmem::config::{DataPaths, ScreenMemConfig};
use screenmem::frames::ocr::{FrameOcrSearcher, TesseractRecognizer};
use screenmem::records::types::format_timestamp;

/// List buffered frames, newest first.
pub fn list(paths: &DataPaths, config: &ScreenMemConfig, within: u64, limit: i64) -> Result<()> {
    let store = super::frame_store(paths, config);
    let frames = store.recent_frames(within, limit);

    if frames.is_empty() {
        println!("No frames in the last {within}s.");
        return Ok(());
    }

    for path in &frames {
        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .map(|t| format_timestamp(&DateTime::<Utc>::from(t)))
            .unwrap_or_else(|_| "?".to_string());
        println!("{modified}  {}", path.display());
    }
    Ok(())
}

/// OCR recent frames and print those containing `query`.
pub fn search(paths: &DataPaths, config: &ScreenMemConfig, query: &str, within: u64, limit: usize) -> Result<()> {
    let store = super::frame_store(paths, config);
    let hits = FrameOcrSearcher::new(&store, TesseractRecognizer::default()).search(query, within, limit)?;

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for hit in &hits {
        println!("[{}] {}", format_timestamp(&hit.timestamp), hit.frame_path.display());
        println!("{}", hit.snippet);
        println!("---");
    }
    Ok(())
}
