//! Rolling buffer of downscaled JPEG screen frames.
//!
//! The directory is owned by [`FrameRetentionStore`]. Listing and pruning
//! always rescan it, so files removed or touched by someone else are picked up
//! on the next call.

pub mod ocr;
pub mod screen;

use chrono::Utc;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;

use crate::config::FramesConfig;
use screen::ScreenSource;

#[derive(Debug, Error)]
pub enum FrameError {
    #[error("frame directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Retention and encoding knobs, taken from `[frames]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    pub retention: Duration,
    pub max_frames: usize,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl From<&FramesConfig> for RetentionPolicy {
    fn from(config: &FramesConfig) -> Self {
        Self {
            retention: Duration::from_secs(config.retention_seconds),
            max_frames: config.max_frames,
            max_dimension: config.max_dimension,
            jpeg_quality: config.jpeg_quality.clamp(1, 100),
        }
    }
}

/// A frame file and its modification time.
#[derive(Debug, Clone)]
pub struct FrameEntry {
    pub path: PathBuf,
    pub modified: SystemTime,
}

pub struct FrameRetentionStore {
    dir: PathBuf,
    policy: RetentionPolicy,
    screen: Arc<dyn ScreenSource>,
}

impl FrameRetentionStore {
    pub fn new(dir: impl Into<PathBuf>, policy: RetentionPolicy, screen: Arc<dyn ScreenSource>) -> Self {
        Self {
            dir: dir.into(),
            policy,
            screen,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Grab, downscale, encode and write one frame, then prune.
    ///
    /// Returns `Ok(None)` when the screen cannot be grabbed or the frame cannot
    /// be encoded or written. Only directory creation and listing fail.
    pub fn capture_frame(&self) -> Result<Option<PathBuf>, FrameError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| FrameError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let Some(image) = self.screen.grab() else {
            tracing::debug!("screen capture unavailable; no frame written");
            return Ok(None);
        };

        let jpeg = match encode_frame(image, self.policy.max_dimension, self.policy.jpeg_quality) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "frame encoding failed");
                return Ok(None);
            }
        };

        let path = self.dir.join(format!("frame-{}.jpg", Utc::now().timestamp_millis()));
        if let Err(e) = std::fs::write(&path, &jpeg) {
            tracing::warn!(path = %path.display(), error = %e, "frame write failed");
            return Ok(None);
        }
        tracing::debug!(path = %path.display(), bytes = jpeg.len(), "frame captured");

        self.prune()?;
        Ok(Some(path))
    }

    /// Frames modified within the last `within_seconds`, newest first.
    pub fn recent_frames(&self, within_seconds: u64, limit: i64) -> Vec<PathBuf> {
        if limit <= 0 {
            return Vec::new();
        }
        let now = SystemTime::now();
        let window = Duration::from_secs(within_seconds);

        let mut entries = match self.entries() {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "cannot list frames");
                return Vec::new();
            }
        };
        entries.retain(|e| age(now, e.modified) <= window);
        entries.sort_by(|a, b| b.modified.cmp(&a.modified));
        entries.truncate(limit as usize);
        entries.into_iter().map(|e| e.path).collect()
    }

    /// Drop frames past the retention age, then the oldest beyond the count cap.
    /// Returns how many files were removed. Files that cannot be removed are left
    /// for the next pass.
    pub fn prune(&self) -> Result<usize, FrameError> {
        let now = SystemTime::now();
        let mut removed = 0;

        for entry in self.entries()? {
            if age(now, entry.modified) > self.policy.retention && remove(&entry.path) {
                removed += 1;
            }
        }

        let mut remaining = self.entries()?;
        if remaining.len() > self.policy.max_frames {
            remaining.sort_by(|a, b| b.modified.cmp(&a.modified));
            for entry in &remaining[self.policy.max_frames..] {
                if remove(&entry.path) {
                    removed += 1;
                }
            }
        }

        if removed > 0 {
            tracing::debug!(removed, "pruned frames");
        }
        Ok(removed)
    }

    /// Every regular `.jpg` file in the directory. A missing directory has no frames.
    pub fn entries(&self) -> Result<Vec<FrameEntry>, FrameError> {
        let read_dir = match std::fs::read_dir(&self.dir) {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(FrameError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut entries = Vec::new();
        for item in read_dir.flatten() {
            let path = item.path();
            if !is_frame_file(&path) {
                continue;
            }
            let Ok(meta) = item.metadata() else { continue };
            if !meta.is_file() {
                continue;
            }
            entries.push(FrameEntry {
                path,
                modified: meta.modified().unwrap_or(SystemTime::UNIX_EPOCH),
            });
        }
        Ok(entries)
    }
}

fn is_frame_file(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'));
    let jpg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg"));
    jpg && !hidden
}

/// Zero for timestamps in the future.
fn age(now: SystemTime, modified: SystemTime) -> Duration {
    now.duration_since(modified).unwrap_or(Duration::ZERO)
}

fn remove(path: &Path) -> bool {
    match std::fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "frame not removed");
            false
        }
    }
}

/// Downscale so neither side exceeds `max_dimension`, then JPEG-encode.
pub fn encode_frame(image: RgbaImage, max_dimension: u32, quality: u8) -> image::ImageResult<Vec<u8>> {
    let mut frame = DynamicImage::ImageRgba8(image);
    if frame.width().max(frame.height()) > max_dimension {
        frame = frame.thumbnail(max_dimension, max_dimension);
    }

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality).encode_image(&frame.to_rgb8())?;
    Ok(buf)
}
