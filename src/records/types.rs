//! Capture record type definitions.
//!
//! Defines [`TextSource`] (where the text came from), [`CaptureTrigger`] (what
//! prompted the capture), [`CaptureRecord`] (one persisted observation), and the
//! derived [`SearchResult`] / [`StoreStatus`] views.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

/// App name stored when the capture mechanism cannot tell which app was focused.
pub const UNKNOWN_APP: &str = "Unknown";

/// How the text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// Read from the UI element tree of the focused window.
    Accessibility,
    /// Recognized from pixels.
    Ocr,
    /// Supplied by hand (`ingest`) or by tests.
    Synthetic,
}

impl TextSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accessibility => "accessibility",
            Self::Ocr => "ocr",
            Self::Synthetic => "synthetic",
        }
    }
}

impl std::fmt::Display for TextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TextSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accessibility" => Ok(Self::Accessibility),
            "ocr" => Ok(Self::Ocr),
            "synthetic" => Ok(Self::Synthetic),
            other => Err(format!(
                "invalid source: {other}. Expected: accessibility, ocr, synthetic"
            )),
        }
    }
}

/// The event that caused a capture attempt. Has no bearing on deduplication.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureTrigger {
    AppSwitch,
    FocusChange,
    Click,
    TypingPause,
    ScrollStop,
    Clipboard,
    Idle,
    Manual,
}

impl CaptureTrigger {
    pub const ALL: [CaptureTrigger; 8] = [
        Self::AppSwitch,
        Self::FocusChange,
        Self::Click,
        Self::TypingPause,
        Self::ScrollStop,
        Self::Clipboard,
        Self::Idle,
        Self::Manual,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AppSwitch => "app_switch",
            Self::FocusChange => "focus_change",
            Self::Click => "click",
            Self::TypingPause => "typing_pause",
            Self::ScrollStop => "scroll_stop",
            Self::Clipboard => "clipboard",
            Self::Idle => "idle",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for CaptureTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CaptureTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("invalid trigger: {s}"))
    }
}

/// One persisted observation. `id` and `inserted_at` are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureRecord {
    pub id: Option<i64>,
    pub timestamp: DateTime<Utc>,
    pub app_name: String,
    pub window_title: Option<String>,
    pub bundle_id: Option<String>,
    pub source: TextSource,
    pub trigger: CaptureTrigger,
    pub display_id: Option<String>,
    /// SHA-256 hex of the trimmed text.
    pub text_hash: String,
    /// Character count of the trimmed text.
    pub text_length: usize,
    pub text_content: String,
    pub inserted_at: Option<DateTime<Utc>>,
}

/// A search hit: identifying fields plus a highlighted snippet.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub app_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_title: Option<String>,
    #[serde(rename = "bundleID", skip_serializing_if = "Option::is_none")]
    pub bundle_id: Option<String>,
    pub source: TextSource,
    pub trigger: CaptureTrigger,
    pub snippet: String,
}

/// Aggregate view of the store, recomputed on every call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub record_count: u64,
    pub last_capture_at: Option<DateTime<Utc>>,
    pub database_bytes: u64,
}

/// Fixed-width UTC form used for every stored timestamp, so that string
/// comparison in SQL matches chronological order.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// `ts` cut down to the microsecond precision timestamps are stored with.
pub fn stored_precision(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// `now - age`, clamped to the Unix epoch.
pub fn cutoff_before(now: DateTime<Utc>, age: chrono::Duration) -> DateTime<Utc> {
    now.checked_sub_signed(age)
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
        .max(DateTime::<Utc>::UNIX_EPOCH)
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
