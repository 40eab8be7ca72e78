//! Config file storage.
//!
//! Responsibilities:
//! - Load `config.toml` into `ClientConfig` (missing file means defaults)
//! - Apply environment overrides on top of the file
//! - Write the default file on request
//!
//! Does NOT:
//! - Watch the file for changes
//! - Merge multiple config files

use crate::paths::TriagePaths;
use std::fs;
use std::path::{Path, PathBuf};
use triage_core::config::ClientConfig;
use triage_core::{Result, TriageError};

/// Overrides `api.base_url`.
pub const ENV_BASE_URL: &str = "TRIAGE_BASE_URL";
/// Overrides `api.request_timeout_secs`.
pub const ENV_TIMEOUT_SECS: &str = "TRIAGE_TIMEOUT_SECS";

/// Storage for the client configuration file (config.toml).
pub struct ConfigStorage {
    path: PathBuf,
}

impl ConfigStorage {
    /// Creates a storage for the default path (`~/.config/triage/config.toml`).
    ///
    /// # Errors
    ///
    /// Returns `TriageError::Config` if the home directory cannot be found.
    pub fn new() -> Result<Self> {
        let path = TriagePaths::config_file().map_err(|e| TriageError::config(e.to_string()))?;
        Ok(Self { path })
    }

    /// Creates a storage with a custom path (for testing or `--config`).
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the file without environment overrides.
    ///
    /// # Returns
    ///
    /// - `Ok(ClientConfig::default())`: File doesn't exist
    /// - `Ok(config)`: Successfully loaded and parsed
    /// - `Err(_)`: Unreadable file or invalid TOML
    pub fn load_file(&self) -> Result<ClientConfig> {
        if !self.path.exists() {
            tracing::debug!(target: "config", path = %self.path.display(), "No config file, using defaults");
            return Ok(ClientConfig::default());
        }

        let content = fs::read_to_string(&self.path)?;
        let config: ClientConfig = toml::from_str(&content)?;
        tracing::info!(target: "config", path = %self.path.display(), "Loaded config file");
        Ok(config)
    }

    /// Loads the file, applies process environment overrides and validates.
    pub fn load(&self) -> Result<ClientConfig> {
        let config = apply_env_overrides(self.load_file()?, |key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the default configuration if no file exists yet.
    ///
    /// Returns the path of the (existing or new) file.
    pub fn ensure_default_file(&self) -> Result<PathBuf> {
        if self.path.exists() {
            return Ok(self.path.clone());
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let template = toml::to_string_pretty(&ClientConfig::default())?;
        fs::write(&self.path, template)?;
        tracing::info!(target: "config", path = %self.path.display(), "Wrote default config file");

        Ok(self.path.clone())
    }
}

/// Applies `TRIAGE_*` overrides looked up through `lookup`.
///
/// # Errors
///
/// Returns `TriageError::Config` when an override has an unparsable value.
pub fn apply_env_overrides<F>(mut config: ClientConfig, lookup: F) -> Result<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
        config.api.base_url = base_url.trim().to_string();
    }

    if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
        config.api.request_timeout_secs = raw.trim().parse().map_err(|_| {
            TriageError::config(format!("{ENV_TIMEOUT_SECS} must be a number of seconds, got '{raw}'"))
        })?;
    }

    Ok(config)
}
