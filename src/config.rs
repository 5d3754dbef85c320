use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Upper bound accepted by `set` for `retention_days` (about a century).
pub const MAX_RETENTION_DAYS: u32 = 36_500;

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ScreenMemConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub capture: CaptureConfig,
    pub frames: FramesConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub max_connections: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub retention_days: u32,
    pub max_db_size_mb: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CaptureConfig {
    pub idle_gap_seconds: u64,
    pub active_gap_seconds: u64,
    pub min_capture_interval_ms: u64,
    pub ocr_enabled: bool,
    pub minimum_accessibility_chars: usize,
    pub duplicate_window_seconds: u64,
    pub ignored_apps: Vec<String>,
    pub extract_timeout_ms: u64,
    /// Program (plus arguments) printing the focused window's text on stdout.
    pub accessibility_command: Vec<String>,
    /// Program (plus arguments) printing OCR text of the screen on stdout.
    pub ocr_command: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct FramesConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub retention_seconds: u64,
    pub max_frames: usize,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for ScreenMemConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            capture: CaptureConfig::default(),
            frames: FramesConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 41733,
            log_level: "info".into(),
            max_connections: 64,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            retention_days: 14,
            max_db_size_mb: 200,
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            idle_gap_seconds: 30,
            active_gap_seconds: 10,
            min_capture_interval_ms: 200,
            ocr_enabled: false,
            minimum_accessibility_chars: 12,
            duplicate_window_seconds: 2,
            ignored_apps: Vec::new(),
            extract_timeout_ms: 1500,
            accessibility_command: Vec::new(),
            ocr_command: Vec::new(),
        }
    }
}

impl Default for FramesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 5,
            retention_seconds: 120,
            max_frames: 48,
            max_dimension: 1280,
            jpeg_quality: 45,
        }
    }
}

/// On-disk layout of one data directory.
#[derive(Debug, Clone)]
pub struct DataPaths {
    pub base_dir: PathBuf,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
    pub logs_dir: PathBuf,
    pub frames_dir: PathBuf,
}

impl DataPaths {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        let base_dir = base_dir.into();
        Self {
            db_path: base_dir.join("screenmem.db"),
            config_path: base_dir.join("config.toml"),
            logs_dir: base_dir.join("logs"),
            frames_dir: base_dir.join("frames"),
            base_dir,
        }
    }

    /// Resolve from `SCREENMEM_DATA_DIR`, falling back to `~/.screenmem/`.
    pub fn resolve() -> Self {
        match std::env::var("SCREENMEM_DATA_DIR") {
            Ok(dir) if !dir.is_empty() => Self::new(expand_tilde(&dir)),
            _ => Self::new(default_data_dir()),
        }
    }

    /// Create the base and logs directories.
    pub fn ensure(&self) -> Result<()> {
        std::fs::create_dir_all(&self.base_dir)
            .with_context(|| format!("failed to create {}", self.base_dir.display()))?;
        std::fs::create_dir_all(&self.logs_dir)
            .with_context(|| format!("failed to create {}", self.logs_dir.display()))?;
        Ok(())
    }
}

/// Returns `~/.screenmem/`
pub fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .expect("home directory must exist")
        .join(".screenmem")
}

impl ScreenMemConfig {
    /// Load config from the data directory (if present) then apply env var overrides.
    pub fn load(paths: &DataPaths) -> Result<Self> {
        Self::load_from(&paths.config_path)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// The file contents alone, without environment overrides. Use this before `save`.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            info!("no config file at {}, using defaults", path.display());
            return Ok(ScreenMemConfig::default());
        }
        let contents = std::fs::read_to_string(path).context("failed to read config file")?;
        toml::from_str(&contents).context("failed to parse config TOML")
    }

    /// Write the config back as TOML.
    pub fn save(&self, paths: &DataPaths) -> Result<()> {
        paths.ensure()?;
        let contents = toml::to_string_pretty(self).context("failed to serialize config")?;
        let tmp = paths.config_path.with_extension("toml.tmp");
        std::fs::write(&tmp, contents)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &paths.config_path).context("failed to replace config file")?;
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("SCREENMEM_LOG_LEVEL") {
            self.server.log_level = val;
        }
    }

    /// Set one option by its flat key name, validating the value.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "retention_days" => {
                self.storage.retention_days = parse_range(value, 1, MAX_RETENTION_DAYS)?
            }
            "max_db_size_mb" => self.storage.max_db_size_mb = parse_min(value, 50)?,
            "idle_gap_seconds" => self.capture.idle_gap_seconds = parse_min(value, 5)?,
            "active_gap_seconds" => self.capture.active_gap_seconds = parse_min(value, 1)?,
            "min_capture_interval_ms" => {
                self.capture.min_capture_interval_ms = parse_min(value, 100)?
            }
            "ocr_enabled" => self.capture.ocr_enabled = parse_bool(value)?,
            "minimum_accessibility_chars" => {
                self.capture.minimum_accessibility_chars = parse_min(value, 1)?
            }
            "duplicate_window_seconds" => {
                self.capture.duplicate_window_seconds = parse_min(value, 0)?
            }
            "ignored_apps" => {
                self.capture.ignored_apps = value
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            }
            "frame_buffer_enabled" => self.frames.enabled = parse_bool(value)?,
            "frame_buffer_interval_seconds" => {
                self.frames.interval_seconds = parse_min(value, 1)?
            }
            "frame_buffer_retention_seconds" => {
                self.frames.retention_seconds = parse_min(value, 10)?
            }
            "frame_buffer_max_frames" => self.frames.max_frames = parse_min(value, 1)?,
            "frame_buffer_jpeg_quality" => {
                let quality: u8 = parse_min(value, 1)?;
                if quality > 100 {
                    bail!("invalid value: {value}");
                }
                self.frames.jpeg_quality = quality;
            }
            other => bail!("unknown config key: {other}"),
        }
        Ok(())
    }
}

fn parse_range<T>(value: &str, min: T, max: T) -> Result<T>
where
    T: std::str::FromStr + PartialOrd,
{
    match parse_min(value, min)? {
        parsed if parsed <= max => Ok(parsed),
        _ => bail!("invalid value: {value}"),
    }
}

fn parse_min<T>(value: &str, min: T) -> Result<T>
where
    T: std::str::FromStr + PartialOrd,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed >= min => Ok(parsed),
        _ => bail!("invalid value: {value}"),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => bail!("invalid value: {value}"),
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        dirs::home_dir()
            .expect("home directory must exist")
            .join(rest)
    } else {
        PathBuf::from(path)
    }
}
