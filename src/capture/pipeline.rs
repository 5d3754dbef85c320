use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use super::{Extractor, IngestError};
use crate::hashing::content_hash;
use crate::records::types::stored_precision;
use crate::records::{CaptureRecord, CaptureTrigger, RecordStore};

/// What one capture attempt did.
#[derive(Debug, Clone)]
pub enum CaptureOutcome {
    /// A new record was committed; `record.id` is set.
    Stored(CaptureRecord),
    SkippedDuplicate,
    SkippedNoText,
}

/// Last committed hash and when it was committed. Lives only as long as the
/// pipeline that owns it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupState {
    last: Option<(String, DateTime<Utc>)>,
}

impl DedupState {
    /// True when `hash` matches the last commit and `now` is within `window` of it (inclusive).
    pub fn is_duplicate(&self, hash: &str, now: DateTime<Utc>, window: Duration) -> bool {
        match &self.last {
            Some((last_hash, last_at)) => last_hash == hash && now - *last_at <= window,
            None => false,
        }
    }

    pub fn record(&mut self, hash: String, at: DateTime<Utc>) {
        self.last = Some((hash, at));
    }
}

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send>;

pub struct IngestPipeline {
    store: Arc<RecordStore>,
    extractor: Box<dyn Extractor>,
    window: Duration,
    clock: Clock,
    state: DedupState,
}

impl IngestPipeline {
    pub fn new(store: Arc<RecordStore>, extractor: Box<dyn Extractor>, duplicate_window_seconds: u64) -> Self {
        Self {
            store,
            extractor,
            window: Duration::seconds(duplicate_window_seconds as i64),
            clock: Box::new(Utc::now),
            state: DedupState::default(),
        }
    }

    /// Replace the wall clock, e.g. with a scripted one in tests.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn state(&self) -> &DedupState {
        &self.state
    }

    /// Run one capture attempt. A store failure is returned as-is; nothing is retried.
    pub fn capture(&mut self, trigger: CaptureTrigger) -> Result<CaptureOutcome, IngestError> {
        let Some(extracted) = self.extractor.extract().map_err(IngestError::Extract)? else {
            return Ok(CaptureOutcome::SkippedNoText);
        };

        let text = extracted.text.trim();
        if text.is_empty() {
            return Ok(CaptureOutcome::SkippedNoText);
        }

        let hash = content_hash(text);
        let now = stored_precision((self.clock)());
        if self.state.is_duplicate(&hash, now, self.window) {
            tracing::debug!(app = %extracted.metadata.app_name, "duplicate capture suppressed");
            return Ok(CaptureOutcome::SkippedDuplicate);
        }

        let meta = extracted.metadata;
        let mut record = CaptureRecord {
            id: None,
            timestamp: now,
            app_name: meta.app_name,
            window_title: meta.window_title,
            bundle_id: meta.bundle_id,
            source: extracted.source,
            trigger,
            display_id: meta.display_id,
            text_hash: hash.clone(),
            text_length: text.chars().count(),
            text_content: text.to_string(),
            inserted_at: None,
        };

        let id = self.store.insert(&record)?;
        record.id = Some(id);
        self.state.record(hash, now);

        Ok(CaptureOutcome::Stored(record))
    }
}
