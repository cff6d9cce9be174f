//! XYZ Bank Common Library
//!
//! Configuration shared by the suite runner and its harness.

pub mod config;
pub mod error;

pub use config::{keys, ConfigSource, Settings};
pub use error::{ConfigError, ConfigResult};

/// Suite version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default location of the file-default configuration layer
pub fn default_config_path() -> std::path::PathBuf {
    std::path::PathBuf::from("config").join("xyzbank.toml")
}
