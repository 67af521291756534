//! Runtime configuration.
//!
//! # Responsibility
//! - Load `matjip.json` into [`MatjipConfig`].
//! - Provide defaults for every field so a minimal `{}` file is valid.
//!
//! # Invariants
//! - Loading never falls back silently: a missing file or bad JSON is a
//!   [`ConfigError`]. Callers decide whether to use [`MatjipConfig::default`].

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default config file name looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "matjip.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level configuration file structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MatjipConfig {
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Directory uploaded images are written under.
    pub media_root: PathBuf,
    /// Public URL prefix for stored images.
    pub media_url: String,
    /// One of `trace|debug|info|warn|error`.
    pub log_level: String,
    /// Absolute log directory; file logging is off when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for MatjipConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./matjip.sqlite3"),
            media_root: PathBuf::from("./media"),
            media_url: "/media/".to_string(),
            log_level: crate::logging::default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl MatjipConfig {
    /// Loads configuration from `path`.
    ///
    /// # Errors
    /// - The file does not exist or cannot be read.
    /// - The JSON is invalid or carries unknown fields.
    /// - `database_path` or `media_url` is empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&content).map_err(|err| match err {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        Ok(config)
    }

    /// Parses configuration from a JSON string.
    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path cannot be empty".into()));
        }
        if self.media_url.trim().is_empty() {
            return Err(ConfigError::Invalid("media_url cannot be empty".into()));
        }
        Ok(())
    }
}
