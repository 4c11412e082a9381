//! Error types for the persist module.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while writing a body to disk.
///
/// None of these are retried here; callers decide whether to re-run the
/// whole fetch.
#[derive(Debug, Error)]
pub enum PersistError {
    /// File system error (create directory, create file, write, rename).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A name derived from a URL would escape the output directory.
    #[error("refusing unsafe path {path} derived from {url}")]
    UnsafePath {
        /// The source URL.
        url: String,
        /// The decoded path that was rejected.
        path: String,
    },

    /// The URL path has no final segment to name the file after.
    #[error("no filename in URL {url}")]
    MissingFilename {
        /// The source URL.
        url: String,
    },
}

impl PersistError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an unsafe-path error.
    pub fn unsafe_path(url: impl Into<String>, path: impl Into<String>) -> Self {
        Self::UnsafePath {
            url: url.into(),
            path: path.into(),
        }
    }

    /// Creates a missing-filename error.
    pub fn missing_filename(url: impl Into<String>) -> Self {
        Self::MissingFilename { url: url.into() }
    }
}
