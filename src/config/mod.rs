//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk, applying
//! environment overrides, and validating the result.
//!
//! # Configuration File Locations
//!
//! 1. Path specified on the command line (`--config`), which must exist
//! 2. Default location, used only when present:
//!    - **Linux/macOS:** `~/.healthco-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.healthco-mcp\config.json`
//!
//! Without either, built-in defaults are used. Hosted deployments usually
//! configure everything through environment variables.

mod settings;

pub use settings::{
    Config, HttpConfig, LoggingConfig, UpstreamConfig, DEFAULT_TIMEOUT_SECS, DEFAULT_UPSTREAM_URL,
};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns the default configuration directory.
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".healthco-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads the configuration, applies process environment overrides and
/// validates it.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - An environment override or field value is invalid
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Same as [`load_config`] with an explicit environment lookup.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_with_env<F>(path: Option<&Path>, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(p) => {
            if !p.exists() {
                return Err(ConfigError::NotFound {
                    path: p.to_path_buf(),
                });
            }
            read_config_file(p)?
        }
        None => match default_config_path() {
            Some(p) if p.exists() => read_config_file(&p)?,
            _ => Config::default(),
        },
    };

    config.apply_env(lookup)?;
    config.validate()?;

    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}
