//! Error types for the download module.

use thiserror::Error;

use crate::fetch::FetchError;
use crate::persist::PersistError;

/// A fetch-then-persist operation failed in one of its two halves.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The resource could not be fetched.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The resource was fetched but could not be written.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl DownloadError {
    /// Returns true when the failure happened on disk rather than on the wire.
    #[must_use]
    pub fn is_persist(&self) -> bool {
        matches!(self, Self::Persist(_))
    }
}

/// A batch stopped at the first failing item.
///
/// `completed` is the number of items written before the failure, which is
/// also the index to resume from.
#[derive(Debug, Error)]
#[error("item {index} ({url}) failed after {completed} completed: {source}")]
pub struct BatchError {
    /// Zero-based index of the failing item.
    pub index: usize,
    /// URL of the failing item.
    pub url: String,
    /// Items written before the failure.
    pub completed: usize,
    /// What went wrong.
    #[source]
    pub source: DownloadError,
}
