//! Extraction strategies.

use anyhow::{Context, Result};
use std::io::Read;
use std::process::{Command, Stdio};
use std::sync::{mpsc, Mutex};
use std::time::{Duration, Instant};

use super::window::{MetadataProvider, X11Metadata};
use super::{CaptureMetadata, ExtractedText, Extractor};
use crate::config::CaptureConfig;
use crate::records::TextSource;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Hands out one fixed text, then nothing. Used for manual ingestion.
pub struct SyntheticExtractor {
    pending: Mutex<Option<ExtractedText>>,
}

impl SyntheticExtractor {
    pub fn new(text: impl Into<String>, metadata: CaptureMetadata) -> Self {
        Self::with_source(text, TextSource::Synthetic, metadata)
    }

    pub fn with_source(text: impl Into<String>, source: TextSource, metadata: CaptureMetadata) -> Self {
        Self {
            pending: Mutex::new(Some(ExtractedText {
                text: text.into(),
                source,
                metadata,
            })),
        }
    }
}

impl Extractor for SyntheticExtractor {
    fn extract(&self) -> Result<Option<ExtractedText>> {
        let mut pending = self.pending.lock().unwrap_or_else(|p| p.into_inner());
        Ok(pending.take())
    }
}

/// Runs an external program and takes its stdout as the screen text.
///
/// The program is killed when it outlives `timeout`. Its stdout must also be
/// closed within that budget. Anything else counts as "no text", as do a
/// non-zero exit and empty output.
pub struct CommandExtractor {
    argv: Vec<String>,
    timeout: Duration,
    source: TextSource,
}

impl CommandExtractor {
    pub fn new(argv: Vec<String>, timeout: Duration, source: TextSource) -> Option<Self> {
        if argv.is_empty() {
            return None;
        }
        Some(Self { argv, timeout, source })
    }

    /// Trimmed stdout of the program, or `None`.
    pub fn read_text(&self) -> Result<Option<String>> {
        let mut child = Command::new(&self.argv[0])
            .args(&self.argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to spawn {}", self.argv[0]))?;

        // Drain stdout on its own thread so a chatty child cannot block on a full pipe.
        // Grandchildren can inherit the pipe and outlive a killed child, so the
        // reader is never joined; its result arrives on a channel or not at all.
        let mut stdout = child.stdout.take().context("child stdout not captured")?;
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = tx.send(stdout.read_to_end(&mut buf).map(|_| buf));
        });

        let deadline = Instant::now() + self.timeout;
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break Some(status);
            }
            if Instant::now() >= deadline {
                let _ = child.kill();
                let _ = child.wait();
                break None;
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let Some(status) = status else {
            tracing::debug!(program = %self.argv[0], timeout_ms = self.timeout.as_millis() as u64, "extract command timed out");
            return Ok(None);
        };

        let wait = deadline.saturating_duration_since(Instant::now()).max(POLL_INTERVAL);
        let output = match rx.recv_timeout(wait) {
            Ok(read) => read?,
            Err(_) => {
                tracing::debug!(program = %self.argv[0], "extract command exited but its output is still held open");
                return Ok(None);
            }
        };

        if !status.success() {
            tracing::debug!(program = %self.argv[0], %status, "extract command failed");
            return Ok(None);
        }
        let text = String::from_utf8_lossy(&output).trim().to_string();
        Ok((!text.is_empty()).then_some(text))
    }
}

impl Extractor for CommandExtractor {
    fn extract(&self) -> Result<Option<ExtractedText>> {
        Ok(self.read_text()?.map(|text| ExtractedText {
            text,
            source: self.source,
            metadata: super::window::active_window(),
        }))
    }
}

/// The desktop strategy: window metadata, accessibility text when there is
/// enough of it, OCR otherwise (when enabled).
pub struct NativeExtractor {
    metadata: Box<dyn MetadataProvider>,
    accessibility: Option<CommandExtractor>,
    ocr: Option<CommandExtractor>,
    minimum_accessibility_chars: usize,
    ocr_enabled: bool,
    ignored_apps: Vec<String>,
}

impl NativeExtractor {
    pub fn from_config(config: &CaptureConfig) -> Self {
        let timeout = Duration::from_millis(config.extract_timeout_ms);
        Self {
            metadata: Box::new(X11Metadata),
            accessibility: CommandExtractor::new(
                config.accessibility_command.clone(),
                timeout,
                TextSource::Accessibility,
            ),
            ocr: CommandExtractor::new(config.ocr_command.clone(), timeout, TextSource::Ocr),
            minimum_accessibility_chars: config.minimum_accessibility_chars,
            ocr_enabled: config.ocr_enabled,
            ignored_apps: config.ignored_apps.iter().map(|a| a.to_lowercase()).collect(),
        }
    }

    pub fn with_metadata(mut self, provider: Box<dyn MetadataProvider>) -> Self {
        self.metadata = provider;
        self
    }

    fn is_ignored(&self, app_name: &str) -> bool {
        let app = app_name.to_lowercase();
        self.ignored_apps.iter().any(|pattern| !pattern.is_empty() && app.contains(pattern.as_str()))
    }
}

impl Extractor for NativeExtractor {
    fn extract(&self) -> Result<Option<ExtractedText>> {
        let metadata = self.metadata.current();
        if self.is_ignored(&metadata.app_name) {
            tracing::debug!(app = %metadata.app_name, "app is ignored");
            return Ok(None);
        }

        if let Some(accessibility) = &self.accessibility {
            match accessibility.read_text() {
                Ok(Some(text)) if text.chars().count() >= self.minimum_accessibility_chars => {
                    return Ok(Some(ExtractedText {
                        text,
                        source: TextSource::Accessibility,
                        metadata,
                    }));
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "accessibility read failed"),
            }
        }

        if !self.ocr_enabled {
            return Ok(None);
        }
        let Some(ocr) = &self.ocr else {
            return Ok(None);
        };

        Ok(ocr.read_text()?.map(|text| ExtractedText {
            text,
            source: TextSource::Ocr,
            metadata,
        }))
    }
}
