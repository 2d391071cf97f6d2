//! This module defines the error types for linescout.
//!
//! # Where errors surface
//!
//! Most failures in a search are deliberately *not* fatal:
//!
//! - A missing or unreadable root is treated as "nothing to search".
//! - A file that cannot be read or decoded is skipped with a logged warning
//!   and counted in the scan statistics.
//! - An empty query produces an empty stream.
//!
//! The variants below are therefore seen in two places only: the per-file
//! scanner (`FileProcessor::scan_file`), whose errors the dispatcher logs and
//! swallows, and configuration loading.
//!
//! ```rust,ignore
//! match processor.scan_file(path) {
//!     Ok(occurrences) => // forward the batch,
//!     Err(SearchError::PermissionDenied(path)) => // skip, warn,
//!     Err(e) => // skip, warn
//! }
//! ```
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid UTF-8 in file {path}: {source}")]
    EncodingError {
        path: PathBuf,
        source: std::str::Utf8Error,
    },
}

impl SearchError {
    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn invalid_query(msg: impl Into<String>) -> Self {
        Self::InvalidQuery(msg.into())
    }

    pub fn encoding_error(path: impl Into<PathBuf>, source: std::str::Utf8Error) -> Self {
        Self::EncodingError {
            path: path.into(),
            source,
        }
    }

    /// Maps an I/O error raised while opening or reading `path` to the most
    /// specific variant.
    pub fn from_io(path: &Path, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => Self::permission_denied(path),
            _ => Self::IoError(err),
        }
    }
}
