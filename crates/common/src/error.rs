//! Error types for configuration resolution

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`ConfigError`]
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration errors
///
/// Every variant names the offending key or file so a failed run points
/// straight at the setting to fix.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Required setting '{key}' is missing or empty")]
    Missing { key: String },

    #[error("Setting '{key}' has invalid value '{value}' (expected {expected})")]
    Invalid {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("Setting '{key}' has unsupported type {kind}")]
    Unsupported { key: String, kind: &'static str },

    #[error("Cannot read config file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid override '{0}', expected key=value")]
    BadOverride(String),
}

impl ConfigError {
    /// The setting this error is about, if it concerns a single key
    pub fn key(&self) -> Option<&str> {
        match self {
            ConfigError::Missing { key }
            | ConfigError::Invalid { key, .. }
            | ConfigError::Unsupported { key, .. } => Some(key),
            _ => None,
        }
    }
}
