mod config;

pub use config::{ConfigStore, OtaConfig, CONFIG_FILE_NAME};

use std::path::PathBuf;

use crate::error::{ConfigError, Result};

/// Returns `~/.config/otasched[-dev]/` based on OTASCHED_ENV.
///
/// Set OTASCHED_ENV=dev to use the development data directory.
///
/// # Errors
/// Returns an error if the config directory cannot be created.
pub fn data_dir() -> Result<PathBuf> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("OTASCHED_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("otasched-dev")
    } else {
        base_dir.join("otasched")
    };

    std::fs::create_dir_all(&dir).map_err(ConfigError::DataDir)?;
    Ok(dir)
}
