//! Error types for the sift-index crate.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Errors that can occur when working with the persistent store.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Failed to open or create the index.
    #[error("failed to open index at {path}: {message}")]
    OpenIndex {
        /// Path to the index directory.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Failed to write to the index.
    #[error("failed to write to index: {0}")]
    Write(String),

    /// Failed to commit changes to the index.
    #[error("failed to commit index: {0}")]
    Commit(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A stored record could not be decoded.
    #[error("corrupt record for {path}: {message}")]
    CorruptRecord {
        /// Document path of the corrupt record.
        path: String,
        /// Error message.
        message: String,
    },

    /// The query was rejected during rewrite or compilation.
    #[error("invalid query: {message}")]
    QueryInvalid {
        /// The query as the caller wrote it.
        query: String,
        /// The rewritten (normalized) form that was handed to the engine.
        rewritten: String,
        /// What was wrong with it.
        message: String,
        /// Byte position of the offending token, if known.
        position: Option<usize>,
    },

    /// An invalid glob pattern was supplied.
    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        /// The rejected pattern.
        pattern: String,
        /// Underlying glob error.
        source: globset::Error,
    },
}

impl IndexError {
    /// Creates an `OpenIndex` error from a path and Tantivy error.
    pub(crate) fn open_index(path: PathBuf, source: &tantivy::TantivyError) -> Self {
        Self::OpenIndex {
            path,
            message: source.to_string(),
        }
    }

    /// Creates a `Write` error from a Tantivy error.
    pub(crate) fn write(source: &tantivy::TantivyError) -> Self {
        Self::Write(source.to_string())
    }

    /// Creates a `Commit` error from a Tantivy error.
    pub(crate) fn commit(source: &tantivy::TantivyError) -> Self {
        Self::Commit(source.to_string())
    }
}
