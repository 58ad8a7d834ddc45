//! Core error types for otasched-core.
//!
//! This module defines the error hierarchy using thiserror. Expected
//! conditions (missing config file, per-line parse problems) are explicit
//! variants handled as normal control flow, not exceptional paths.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for otasched-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Timer-related errors
    #[error("Timer error: {0}")]
    Timer(#[from] TimerError),

    /// The recurring-check toggle was driven with a value that is not a
    /// two-state input. This is a caller bug, not a runtime condition.
    #[error("Toggle value must be 'true' or 'false', got '{0}'")]
    InvalidToggle(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Backing file does not exist. Recovered by bootstrapping defaults;
    /// never surfaced to lifecycle callers as a hard failure.
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Failed to read the backing file
    #[error("Failed to read configuration from {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the backing file
    #[error("Failed to write configuration to {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value cannot be represented in the line-oriented file format
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Data directory could not be resolved or created
    #[error("Failed to prepare data directory: {0}")]
    DataDir(std::io::Error),
}

/// Timer-port errors.
#[derive(Error, Debug)]
pub enum TimerError {
    /// Platform timer facility missing or refused the request. The
    /// requested transition is aborted, not retried.
    #[error("Platform timer service unavailable")]
    Unavailable,
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
