#![allow(dead_code)]

use chrono::{DateTime, Utc};
use screenmem::capture::{CaptureMetadata, ExtractedText, Extractor};
use screenmem::hashing::content_hash;
use screenmem::probe::{CaptureProbe, PermissionSnapshot, Probes};
use screenmem::records::{CaptureRecord, CaptureTrigger, RecordStore, TextSource};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

/// A file-backed store in a fresh temp directory. Keep the `TempDir` alive.
pub fn temp_store() -> (TempDir, Arc<RecordStore>) {
    let dir = TempDir::new().unwrap();
    let store = RecordStore::open(dir.path().join("screenmem.db")).unwrap();
    (dir, Arc::new(store))
}

/// A record as the pipeline would build it.
pub fn record(app: &str, text: &str, timestamp: DateTime<Utc>) -> CaptureRecord {
    let text = text.trim();
    CaptureRecord {
        id: None,
        timestamp,
        app_name: app.to_string(),
        window_title: Some(format!("{app} window")),
        bundle_id: None,
        source: TextSource::Accessibility,
        trigger: CaptureTrigger::Idle,
        display_id: Some(":0".to_string()),
        text_hash: content_hash(text),
        text_length: text.chars().count(),
        text_content: text.to_string(),
        inserted_at: None,
    }
}

/// Extractor whose next result can be changed between captures.
#[derive(Clone, Default)]
pub struct ScriptedExtractor {
    next: Arc<Mutex<Option<String>>>,
}

impl ScriptedExtractor {
    pub fn set(&self, text: Option<&str>) {
        *self.next.lock().unwrap() = text.map(String::from);
    }
}

impl Extractor for ScriptedExtractor {
    fn extract(&self) -> anyhow::Result<Option<ExtractedText>> {
        Ok(self.next.lock().unwrap().clone().map(|text| ExtractedText {
            text,
            source: TextSource::Accessibility,
            metadata: CaptureMetadata {
                app_name: "Safari".to_string(),
                window_title: Some("Billing".to_string()),
                bundle_id: Some("com.apple.Safari".to_string()),
                display_id: Some(":0".to_string()),
            },
        }))
    }
}

/// A clock the test moves by hand.
#[derive(Clone)]
pub struct ManualClock(Arc<Mutex<DateTime<Utc>>>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Arc::new(Mutex::new(Utc::now())))
    }

    pub fn advance_ms(&self, ms: i64) {
        *self.0.lock().unwrap() += chrono::Duration::milliseconds(ms);
    }

    pub fn advance_ns(&self, ns: i64) {
        *self.0.lock().unwrap() += chrono::Duration::nanoseconds(ns);
    }

    pub fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Probes with fixed answers.
pub struct FakeProbes {
    pub permissions: PermissionSnapshot,
    pub capture: CaptureProbe,
}

impl FakeProbes {
    pub fn granted() -> Self {
        Self {
            permissions: PermissionSnapshot {
                accessibility_granted: true,
                screen_recording_granted: true,
            },
            capture: CaptureProbe {
                granted: true,
                width: 1280,
                height: 800,
                byte_count: 1280 * 800 * 4,
                sample_hash: Some("ab".repeat(32)),
            },
        }
    }
}

impl Probes for FakeProbes {
    fn permissions(&self) -> PermissionSnapshot {
        self.permissions
    }

    fn capture(&self) -> CaptureProbe {
        self.capture.clone()
    }
}

/// Create an empty frame file whose mtime is `age_secs` in the past.
pub fn frame_file(dir: &Path, name: &str, age_secs: u64) {
    let file = std::fs::File::create(dir.join(name)).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
}
