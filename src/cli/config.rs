use anyhow::{Context, Result};

use screenmem::config::{DataPaths, ScreenMemConfig};

pub fn show(config: &ScreenMemConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config).context("failed to serialize config")?;
    print!("{rendered}");
    Ok(())
}

/// Validate and persist one option.
pub fn set(paths: &DataPaths, key: &str, value: &str) -> Result<()> {
    let mut config = ScreenMemConfig::load_file(&paths.config_path)?;
    config.set(key, value)?;
    config.save(paths)?;
    println!("Updated config {key}={value}");
    Ok(())
}
