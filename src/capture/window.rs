//! Active-window metadata.
//!
//! On X11 the focused window is found with `xdotool` and its class with `xprop`.
//! When either tool is missing the capture is attributed to `Unknown`.

use std::process::Command;

use super::CaptureMetadata;

/// Reports which window currently has focus.
pub trait MetadataProvider: Send + Sync {
    fn current(&self) -> CaptureMetadata;
}

/// X11 lookup through the `xdotool` and `xprop` binaries.
#[derive(Debug, Default, Clone, Copy)]
pub struct X11Metadata;

impl MetadataProvider for X11Metadata {
    fn current(&self) -> CaptureMetadata {
        active_window()
    }
}

pub fn active_window() -> CaptureMetadata {
    let mut meta = CaptureMetadata::unknown();
    meta.display_id = std::env::var("DISPLAY").ok().filter(|d| !d.is_empty());

    let Some(window_id) = run("xdotool", &["getactivewindow"]) else {
        return meta;
    };
    meta.window_title = run("xdotool", &["getwindowname", &window_id]).filter(|t| !t.is_empty());

    if let Some(class) = run("xprop", &["-id", &window_id, "WM_CLASS"]) {
        let (instance, class_name) = parse_wm_class(&class);
        if let Some(name) = class_name.clone().or_else(|| instance.clone()) {
            meta.app_name = name;
        }
        meta.bundle_id = instance;
    }

    meta
}

/// `WM_CLASS(STRING) = "instance", "Class"` into its two quoted parts.
fn parse_wm_class(raw: &str) -> (Option<String>, Option<String>) {
    let mut parts = raw.split('"');
    let instance = parts.nth(1).map(str::to_string).filter(|s| !s.is_empty());
    let class = parts.nth(1).map(str::to_string).filter(|s| !s.is_empty());
    (instance, class)
}

fn run(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wm_class_is_split_into_instance_and_class() {
        let (instance, class) = parse_wm_class(r#"WM_CLASS(STRING) = "navigator", "firefox""#);
        assert_eq!(instance.as_deref(), Some("navigator"));
        assert_eq!(class.as_deref(), Some("firefox"));
    }

    #[test]
    fn missing_wm_class_yields_nothing() {
        assert_eq!(parse_wm_class("WM_CLASS:  not found."), (None, None));
    }
}
