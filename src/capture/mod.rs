//! Capture: turning what is on screen into stored records.
//!
//! An [`Extractor`] produces the current text plus window metadata; the
//! [`pipeline::IngestPipeline`] decides whether that text becomes a new record.
//! [`daemon`] drives both on timers.

pub mod daemon;
pub mod extractors;
pub mod pipeline;
pub mod window;

use thiserror::Error;

use crate::records::{StoreError, TextSource};

pub use pipeline::{CaptureOutcome, DedupState, IngestPipeline};

/// Window metadata attached to a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureMetadata {
    pub app_name: String,
    pub window_title: Option<String>,
    pub bundle_id: Option<String>,
    pub display_id: Option<String>,
}

impl CaptureMetadata {
    pub fn unknown() -> Self {
        Self {
            app_name: crate::records::types::UNKNOWN_APP.to_string(),
            window_title: None,
            bundle_id: None,
            display_id: None,
        }
    }
}

/// One extraction result: raw text, where it came from, and the window it came from.
#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub source: TextSource,
    pub metadata: CaptureMetadata,
}

/// A strategy for reading the text currently on screen.
///
/// `Ok(None)` means nothing usable was found, which includes running out of
/// time. Only genuine failures are errors.
pub trait Extractor: Send {
    fn extract(&self) -> anyhow::Result<Option<ExtractedText>>;
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("extractor failed: {0:#}")]
    Extract(anyhow::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
