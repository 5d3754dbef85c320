//! Text search over buffered frames by running OCR on demand.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::FrameRetentionStore;

const MAX_CANDIDATES: i64 = 200;
const CONTEXT_BEFORE: usize = 80;
const CONTEXT_AFTER: usize = 120;
const FALLBACK_PREFIX: usize = 220;

/// Reads the text in one image file.
pub trait FrameRecognizer {
    fn recognize(&self, frame: &Path) -> Result<Option<String>>;
}

/// Shells out to `tesseract <image> stdout`.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    binary: String,
}

impl Default for TesseractRecognizer {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
        }
    }
}

impl FrameRecognizer for TesseractRecognizer {
    fn recognize(&self, frame: &Path) -> Result<Option<String>> {
        let output = Command::new(&self.binary)
            .arg(frame)
            .arg("stdout")
            .output()
            .with_context(|| format!("failed to run {}", self.binary))?;
        if !output.status.success() {
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!text.is_empty()).then_some(text))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameHit {
    pub timestamp: DateTime<Utc>,
    pub frame_path: PathBuf,
    pub snippet: String,
}

pub struct FrameOcrSearcher<'a, R: FrameRecognizer> {
    store: &'a FrameRetentionStore,
    recognizer: R,
}

impl<'a, R: FrameRecognizer> FrameOcrSearcher<'a, R> {
    pub fn new(store: &'a FrameRetentionStore, recognizer: R) -> Self {
        Self { store, recognizer }
    }

    /// Case-insensitive substring search over frames from the last
    /// `within_seconds`, newest first, at most `limit` hits.
    pub fn search(&self, query: &str, within_seconds: u64, limit: usize) -> Result<Vec<FrameHit>> {
        let query = query.trim();
        if query.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        for frame in self.store.recent_frames(within_seconds, MAX_CANDIDATES) {
            if hits.len() >= limit {
                break;
            }
            let Some(text) = self.recognizer.recognize(&frame)? else {
                continue;
            };
            let Some(snippet) = snippet_around(&text, query) else {
                continue;
            };
            let timestamp = std::fs::metadata(&frame)
                .and_then(|m| m.modified())
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| Utc::now());
            hits.push(FrameHit {
                timestamp,
                frame_path: frame,
                snippet,
            });
        }

        hits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(hits)
    }
}

/// Context around the first case-insensitive match, in characters.
/// `None` when `query` does not occur in `text`.
fn snippet_around(text: &str, query: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let lower: Vec<char> = chars.iter().flat_map(|c| c.to_lowercase()).collect();
    let needle: Vec<char> = query.chars().flat_map(|c| c.to_lowercase()).collect();

    // Lowercasing can change length; fall back to a prefix if offsets diverge.
    if lower.len() != chars.len() {
        let found = text.to_lowercase().contains(&query.to_lowercase());
        return found.then(|| chars.iter().take(FALLBACK_PREFIX).collect::<String>().trim().to_string());
    }

    let start = lower.windows(needle.len()).position(|w| w == needle.as_slice())?;
    let from = start.saturating_sub(CONTEXT_BEFORE);
    let to = (start + needle.len() + CONTEXT_AFTER).min(chars.len());
    Some(chars[from..to].iter().collect::<String>().trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::screen::NoScreen;
    use crate::frames::RetentionPolicy;
    use std::collections::HashMap;
    use std::fs::File;
    use std::sync::Arc;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    struct Canned(HashMap<String, String>);

    impl FrameRecognizer for Canned {
        fn recognize(&self, frame: &Path) -> Result<Option<String>> {
            let name = frame.file_name().unwrap().to_string_lossy().into_owned();
            Ok(self.0.get(&name).cloned())
        }
    }

    fn store_with(dir: &Path, frames: &[(&str, u64)]) -> FrameRetentionStore {
        for (name, age) in frames {
            let f = File::create(dir.join(name)).unwrap();
            f.set_modified(SystemTime::now() - Duration::from_secs(*age)).unwrap();
        }
        let policy = RetentionPolicy {
            retention: Duration::from_secs(3600),
            max_frames: 100,
            max_dimension: 1280,
            jpeg_quality: 45,
        };
        FrameRetentionStore::new(dir, policy, Arc::new(NoScreen))
    }

    #[test]
    fn finds_matches_newest_first() {
        let tmp = TempDir::new().unwrap();
        let store = store_with(tmp.path(), &[("frame-1.jpg", 40), ("frame-2.jpg", 10), ("frame-3.jpg", 20)]);
        let ocr = Canned(HashMap::from([
            ("frame-1.jpg".to_string(), "Quarterly INVOICE due".to_string()),
            ("frame-2.jpg".to_string(), "invoice 4832 paid".to_string()),
            ("frame-3.jpg".to_string(), "unrelated".to_string()),
        ]));

        let hits = FrameOcrSearcher::new(&store, ocr).search("Invoice", 120, 10).unwrap();
        let names: Vec<_> = hits
            .iter()
            .map(|h| h.frame_path.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["frame-2.jpg", "frame-1.jpg"]);
    }

    #[test]
    fn blank_query_returns_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = store_with(tmp.path(), &[("frame-1.jpg", 1)]);
        let hits = FrameOcrSearcher::new(&store, Canned(HashMap::new())).search("   ", 60, 5).unwrap();
        assert!(hits.is_empty());
    }

    #[test]
    fn snippet_is_bounded_around_match() {
        let text = format!("{}needle{}", "a".repeat(200), "b".repeat(200));
        let snippet = snippet_around(&text, "NEEDLE").unwrap();
        assert_eq!(snippet.chars().count(), 80 + 6 + 120);
        assert!(snippet.contains("needle"));
        assert!(snippet_around("haystack", "needle").is_none());
    }
}
