//! Screen sources for the frame buffer and the capture probe.

use image::RgbaImage;
use std::sync::Arc;

/// Something that can grab the current screen contents.
///
/// `None` means capture is not possible right now (no display, permission
/// denied, backend not compiled in). It is never an error.
pub trait ScreenSource: Send + Sync {
    fn grab(&self) -> Option<RgbaImage>;
}

/// Always denies capture.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoScreen;

impl ScreenSource for NoScreen {
    fn grab(&self) -> Option<RgbaImage> {
        None
    }
}

/// Primary monitor through `xcap`.
#[cfg(feature = "xcap")]
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapScreen;

#[cfg(feature = "xcap")]
impl ScreenSource for XcapScreen {
    fn grab(&self) -> Option<RgbaImage> {
        let monitors = match xcap::Monitor::all() {
            Ok(monitors) => monitors,
            Err(e) => {
                tracing::debug!(error = %e, "cannot enumerate monitors");
                return None;
            }
        };
        let monitor = monitors.first()?;
        match monitor.capture_image() {
            Ok(image) => Some(image),
            Err(e) => {
                tracing::debug!(error = %e, "screen capture failed");
                None
            }
        }
    }
}

/// The best source compiled into this build.
pub fn default_source() -> Arc<dyn ScreenSource> {
    #[cfg(feature = "xcap")]
    {
        Arc::new(XcapScreen)
    }
    #[cfg(not(feature = "xcap"))]
    {
        Arc::new(NoScreen)
    }
}
