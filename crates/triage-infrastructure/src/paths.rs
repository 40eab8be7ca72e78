//! Unified path management for triage configuration files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/triage/            # Config directory
//! ├── config.toml              # Client configuration
//! └── logs/                    # Application logs
//!     └── triage.log.YYYY-MM-DD
//! ```

use std::path::PathBuf;

const APP_DIR: &str = "triage";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// Home directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

/// Unified path management for triage.
pub struct TriagePaths;

impl TriagePaths {
    /// Returns the triage configuration directory (e.g. `~/.config/triage/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the path to the logs directory.
    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }
}
