//! Durable scheduler configuration.
//!
//! The backing store is a flat text file, one `key=value` per line, with
//! `#`-prefixed comment lines ignored. Parsing is tolerant: a malformed
//! line is logged and skipped, never fatal to the whole load. Writing is
//! strict: the file is rewritten whole via write-to-temp-then-rename so a
//! reader never observes a half-written file.
//!
//! The typed [`OtaConfig`] record is the in-memory shape; the string map
//! format exists only at this serialization boundary.
//!
//! Stored at `~/.config/otasched/ota.conf`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::data_dir;
use crate::error::{ConfigError, Result};

/// File name of the backing store inside the data directory.
pub const CONFIG_FILE_NAME: &str = "ota.conf";

const KEY_PROTOCOL: &str = "protocol";
const KEY_SERVER: &str = "server";
const KEY_PORT: &str = "port";
const KEY_BUILD: &str = "build";
const KEY_ARCHIVE: &str = "archive";
const KEY_MONTHLY: &str = "monthly";

/// Scheduler configuration record.
///
/// Every field except `monthly` is always populated after a successful
/// load (defaulted when missing from the file). `monthly` is the absolute
/// epoch-millisecond fire time of the recurring check; `None` (or a stored
/// value of 0) means no schedule is armed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtaConfig {
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_server")]
    pub server: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_build")]
    pub build: String,
    #[serde(default = "default_archive")]
    pub archive: String,
    /// Next fire time in epoch milliseconds; absent when disarmed.
    #[serde(default)]
    pub monthly: Option<i64>,
    /// Unknown keys are retained verbatim for forward compatibility.
    #[serde(default)]
    pub extras: BTreeMap<String, String>,
}

// Default functions
fn default_protocol() -> String {
    "http".into()
}
fn default_server() -> String {
    "ota.pdiarm.com".into()
}
fn default_port() -> u16 {
    80
}
fn default_build() -> String {
    "build.prop".into()
}
fn default_archive() -> String {
    ".ota.zip".into()
}

impl Default for OtaConfig {
    fn default() -> Self {
        Self {
            protocol: default_protocol(),
            server: default_server(),
            port: default_port(),
            build: default_build(),
            archive: default_archive(),
            monthly: None,
            extras: BTreeMap::new(),
        }
    }
}

impl OtaConfig {
    /// Get a field as a string by its file key. Unknown keys fall back to
    /// the retained extras.
    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            KEY_PROTOCOL => Some(self.protocol.clone()),
            KEY_SERVER => Some(self.server.clone()),
            KEY_PORT => Some(self.port.to_string()),
            KEY_BUILD => Some(self.build.clone()),
            KEY_ARCHIVE => Some(self.archive.clone()),
            KEY_MONTHLY => self.monthly.map(|t| t.to_string()),
            other => self.extras.get(other).cloned(),
        }
    }

    /// Set a string-valued field by its file key. `monthly` is owned by the
    /// scheduler and rejected here; unknown keys go into extras.
    ///
    /// # Errors
    /// Returns an error for an unparsable `port` or an attempt to set
    /// `monthly` through the string boundary.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            KEY_PROTOCOL => self.protocol = value.to_string(),
            KEY_SERVER => self.server = value.to_string(),
            KEY_PORT => {
                self.port = value.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("'{value}' is not a port number"),
                })?;
            }
            KEY_BUILD => self.build = value.to_string(),
            KEY_ARCHIVE => self.archive = value.to_string(),
            KEY_MONTHLY => {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "fire time is managed by the scheduler".to_string(),
                });
            }
            other => {
                self.extras.insert(other.to_string(), value.to_string());
            }
        }
        Ok(())
    }

    fn apply_line(&mut self, line: &str) {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            return;
        }
        let Some((key, value)) = line.split_once('=') else {
            warn!("skipping config line without '=': {line}");
            return;
        };
        if key.is_empty() {
            warn!("skipping config line with empty key: {line}");
            return;
        }
        match key {
            KEY_PROTOCOL => self.protocol = value.to_string(),
            KEY_SERVER => self.server = value.to_string(),
            KEY_PORT => match value.parse() {
                Ok(p) => self.port = p,
                Err(_) => warn!("skipping unparsable port value: {value}"),
            },
            KEY_BUILD => self.build = value.to_string(),
            KEY_ARCHIVE => self.archive = value.to_string(),
            KEY_MONTHLY => match value.parse() {
                Ok(t) => self.monthly = Some(t),
                Err(_) => warn!("skipping unparsable fire time: {value}"),
            },
            other => {
                self.extras.insert(other.to_string(), value.to_string());
            }
        }
    }

    /// Render the record in the fixed file field order: protocol, server,
    /// port, build, archive, extras (sorted), then `monthly` only when a
    /// schedule is armed.
    fn render(&self) -> Result<String, ConfigError> {
        let mut out = String::new();
        let mut push = |key: &str, value: &str| -> Result<(), ConfigError> {
            if key.contains(['\n', '\r', '=']) || value.contains(['\n', '\r']) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "key or value cannot be represented in the line format".to_string(),
                });
            }
            out.push_str(key);
            out.push('=');
            out.push_str(value);
            out.push('\n');
            Ok(())
        };
        push(KEY_PROTOCOL, &self.protocol)?;
        push(KEY_SERVER, &self.server)?;
        push(KEY_PORT, &self.port.to_string())?;
        push(KEY_BUILD, &self.build)?;
        push(KEY_ARCHIVE, &self.archive)?;
        for (key, value) in &self.extras {
            push(key, value)?;
        }
        if let Some(t) = self.monthly {
            if t > 0 {
                push(KEY_MONTHLY, &t.to_string())?;
            }
        }
        Ok(out)
    }
}

/// Handle to the on-disk backing store.
///
/// Load and save on the same store are mutually exclusive: the file is
/// process-wide shared state whose lifecycle spans restarts, so all access
/// goes through one lock.
#[derive(Debug)]
pub struct ConfigStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ConfigStore {
    /// Store backed by `ota.conf` in the default data directory.
    ///
    /// # Errors
    /// Returns an error if the data directory cannot be created.
    pub fn open_default() -> Result<Self> {
        Ok(Self::new(data_dir()?.join(CONFIG_FILE_NAME)))
    }

    /// Store backed by an explicit file path.
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the backing file.
    ///
    /// # Errors
    /// `NotFound` when the file does not exist (callers bootstrap defaults
    /// on that variant); `ReadFailed` for any other IO problem.
    pub fn load(&self) -> Result<OtaConfig, ConfigError> {
        let _guard = self.guard();
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(self.path.clone()));
            }
            Err(e) => {
                return Err(ConfigError::ReadFailed {
                    path: self.path.clone(),
                    source: e,
                });
            }
        };
        let mut config = OtaConfig::default();
        for line in content.lines() {
            config.apply_line(line);
        }
        Ok(config)
    }

    /// Load the backing file, bootstrapping defaults when it is missing.
    ///
    /// Never fails the caller: an unreadable file is logged and the
    /// in-memory defaults are returned.
    pub fn load_or_bootstrap(&self) -> OtaConfig {
        match self.load() {
            Ok(config) => config,
            Err(ConfigError::NotFound(_)) => {
                debug!("no config file yet, writing defaults");
                self.write_defaults()
            }
            Err(e) => {
                error!("failed to load config, using defaults: {e}");
                OtaConfig::default()
            }
        }
    }

    /// Create the backing file with the hard-coded defaults and return them.
    ///
    /// A write failure is logged, not escalated: the defaults are still
    /// returned and scheduling proceeds in-memory.
    pub fn write_defaults(&self) -> OtaConfig {
        let config = OtaConfig::default();
        if let Err(e) = self.save(&config) {
            error!("failed to write default config: {e}");
        }
        config
    }

    /// Whole-file atomic rewrite of the record.
    ///
    /// Writes to a sibling temp file then renames over the target, so a
    /// concurrent `load()` sees either the old or the new file, never a
    /// partial one.
    ///
    /// # Errors
    /// `InvalidValue` for values the line format cannot hold, `WriteFailed`
    /// when the storage cannot be written.
    pub fn save(&self, config: &OtaConfig) -> Result<(), ConfigError> {
        let content = config.render()?;
        let _guard = self.guard();
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| CONFIG_FILE_NAME.to_string());
        let tmp = self.path.with_file_name(format!("{file_name}.tmp"));
        let write_failed = |source: std::io::Error| ConfigError::WriteFailed {
            path: self.path.clone(),
            source,
        };
        std::fs::write(&tmp, content).map_err(write_failed)?;
        std::fs::rename(&tmp, &self.path).map_err(write_failed)?;
        Ok(())
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
