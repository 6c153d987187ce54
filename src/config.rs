// src/config.rs

//! Configuration loading utilities.
//!
//! Configuration comes from an optional TOML file, then environment
//! overrides, and is validated before any run starts.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::Config;

/// Environment variable naming the TOML config file in serverless runs.
pub const CONFIG_PATH_VAR: &str = "LISTWATCH_CONFIG";

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file is missing or unreadable.
pub fn load_config(path: &Path) -> Config {
    if path.exists() {
        Config::load_or_default(path)
    } else {
        log::info!("No config file at {}, using defaults", path.display());
        Config::default()
    }
}

/// Build the configuration for a run: file (if any), then environment
/// overrides, then validation.
pub fn load_runtime_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::load(path).map_err(|e| {
            AppError::config(format!("Failed to load config from {}: {e}", path.display()))
        })?,
        None => Config::default(),
    };

    config.apply_env_overrides();
    config
        .validate()
        .map_err(|e| AppError::config(format!("Invalid configuration: {e}")))?;

    log::info!(
        "Tracking {} categories: {}",
        config.categories.len(),
        config
            .categories
            .iter()
            .map(|c| c.key.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(config)
}
