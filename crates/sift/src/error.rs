//! Error type of the index manager.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the [`crate::SearchIndex`] facade.
#[derive(Debug, Error)]
pub enum Error {
    /// The input path does not exist.
    #[error("input not found: {0}")]
    InputNotFound(PathBuf),

    /// The file extension has no registered converter.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(PathBuf),

    /// A converter rejected its input.
    #[error("conversion failed for {path}: {message}")]
    Converter {
        /// The rejected file.
        path: PathBuf,
        /// The converter's error message.
        message: String,
    },

    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] sift_config::ConfigError),

    /// Storage-layer failure.
    #[error(transparent)]
    Index(#[from] sift_index::IndexError),

    /// I/O failure reading a source file.
    #[error("failed to read {path}: {source}")]
    ReadFile {
        /// The unreadable file.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// JSON encoding failure (CLI output).
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}
