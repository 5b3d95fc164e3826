//! TOML configuration for the d2reader CLI

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use d2reader::ReaderConfig;
use tracing::{info, warn};

/// Parse a reader configuration from a TOML file
pub fn load(path: &Path) -> Result<ReaderConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    toml::from_str(&contents).context("Failed to parse config file")
}

/// Load `path`, falling back to defaults when it is missing or invalid
pub fn load_or_default(path: &Path) -> ReaderConfig {
    if !path.exists() {
        warn!("No config at {}, using defaults", path.display());
        return ReaderConfig::default();
    }

    match load(path) {
        Ok(config) => {
            info!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load config: {:#}, using defaults", e);
            ReaderConfig::default()
        }
    }
}
