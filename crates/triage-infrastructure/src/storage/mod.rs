//! Storage layer for configuration files.

mod config_storage;

pub use config_storage::{ConfigStorage, ENV_BASE_URL, ENV_TIMEOUT_SECS, apply_env_overrides};
