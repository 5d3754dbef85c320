//! Capability probes.
//!
//! A probe never fails: a capability that cannot be checked is reported as
//! not granted.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::Arc;

use crate::frames::screen::ScreenSource;

/// Sample every Nth byte of a captured frame for the probe hash.
const SAMPLE_STRIDE: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionSnapshot {
    pub accessibility_granted: bool,
    pub screen_recording_granted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureProbe {
    pub granted: bool,
    pub width: u32,
    pub height: u32,
    pub byte_count: usize,
    pub sample_hash: Option<String>,
}

impl CaptureProbe {
    pub fn denied() -> Self {
        Self {
            granted: false,
            width: 0,
            height: 0,
            byte_count: 0,
            sample_hash: None,
        }
    }
}

pub trait Probes: Send + Sync {
    fn permissions(&self) -> PermissionSnapshot;
    fn capture(&self) -> CaptureProbe;
}

/// Probes against the running desktop.
pub struct SystemProbes {
    screen: Arc<dyn ScreenSource>,
    accessibility_command: Vec<String>,
}

impl SystemProbes {
    pub fn new(screen: Arc<dyn ScreenSource>, accessibility_command: Vec<String>) -> Self {
        Self {
            screen,
            accessibility_command,
        }
    }
}

impl Probes for SystemProbes {
    fn permissions(&self) -> PermissionSnapshot {
        let accessibility_granted = self
            .accessibility_command
            .first()
            .is_some_and(|program| program_available(program));
        PermissionSnapshot {
            accessibility_granted,
            screen_recording_granted: self.screen.grab().is_some(),
        }
    }

    fn capture(&self) -> CaptureProbe {
        let Some(image) = self.screen.grab() else {
            return CaptureProbe::denied();
        };
        let raw = image.as_raw();
        let mut hasher = Sha256::new();
        for byte in raw.iter().step_by(SAMPLE_STRIDE) {
            hasher.update([*byte]);
        }
        CaptureProbe {
            granted: true,
            width: image.width(),
            height: image.height(),
            byte_count: raw.len(),
            sample_hash: Some(format!("{:x}", hasher.finalize())),
        }
    }
}

/// Whether `program` names an existing file, directly or through `PATH`.
fn program_available(program: &str) -> bool {
    if program.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(program).is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).any(|dir| dir.join(program).is_file()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::screen::NoScreen;
    use image::{Rgba, RgbaImage};

    struct Checker;

    impl ScreenSource for Checker {
        fn grab(&self) -> Option<RgbaImage> {
            Some(RgbaImage::from_fn(40, 30, |x, y| {
                if (x + y) % 2 == 0 {
                    Rgba([0, 0, 0, 255])
                } else {
                    Rgba([255, 255, 255, 255])
                }
            }))
        }
    }

    #[test]
    fn denied_screen_reports_negative_probe() {
        let probes = SystemProbes::new(Arc::new(NoScreen), vec![]);
        assert_eq!(probes.capture(), CaptureProbe::denied());
        assert_eq!(
            probes.permissions(),
            PermissionSnapshot {
                accessibility_granted: false,
                screen_recording_granted: false
            }
        );
    }

    #[test]
    fn granted_screen_reports_dimensions_and_hash() {
        let probes = SystemProbes::new(Arc::new(Checker), vec!["sh".into()]);
        let probe = probes.capture();
        assert!(probe.granted);
        assert_eq!((probe.width, probe.height), (40, 30));
        assert_eq!(probe.byte_count, 40 * 30 * 4);
        assert_eq!(probe.sample_hash.as_ref().map(String::len), Some(64));
        assert_eq!(probes.capture().sample_hash, probe.sample_hash);

        let perms = probes.permissions();
        assert!(perms.screen_recording_granted);
        assert!(perms.accessibility_granted);
    }

    #[test]
    fn unknown_program_is_unavailable() {
        assert!(!program_available("definitely-not-a-real-binary-xyz"));
        assert!(!program_available("/nonexistent/bin/tool"));
    }
}
