//! Error types for sift configuration.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use toml::de;

/// Errors that can occur when loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to parse TOML configuration.
    #[error("failed to parse config file {path}: {source}")]
    ParseToml {
        /// Path to the file that could not be parsed.
        path: PathBuf,
        /// Underlying TOML parse error.
        source: de::Error,
    },

    /// A field weight is zero or negative.
    #[error("weight for {field} must be positive (got {value})")]
    NonPositiveWeight {
        /// Name of the weighted field.
        field: &'static str,
        /// The rejected value.
        value: f32,
    },

    /// A search default is zero.
    #[error("search setting {setting} must be at least 1")]
    ZeroSearchSetting {
        /// Name of the rejected setting.
        setting: &'static str,
    },
}
