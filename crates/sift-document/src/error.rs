//! Error types for the sift-document crate.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when reading or parsing a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// Failed to read a source file.
    #[error("failed to read {path}: {source}")]
    ReadFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The file extension has no registered converter.
    #[error("unsupported format: {path}")]
    UnsupportedFormat {
        /// Path of the rejected file.
        path: PathBuf,
    },
}
