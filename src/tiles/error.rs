//! Error types for the tiles module.

use thiserror::Error;

use super::TileCoordinate;
use crate::fetch::FetchError;
use crate::persist::PersistError;

/// Errors raised while planning or running a tile download.
///
/// `InvalidZoom`, `InvalidRange` and `InvalidServer` are raised before any
/// network activity. `Fetch` and `Persist` name the tile that failed, which
/// is also the coordinate to resume from.
#[derive(Debug, Error)]
pub enum TileError {
    /// Zoom level outside `0..=MAX_ZOOM`.
    #[error("zoom level {zoom} out of range (0 <= z <= {max})", max = super::MAX_ZOOM)]
    InvalidZoom {
        /// The rejected zoom level.
        zoom: u8,
    },

    /// The resume coordinate lies outside the declared bounds.
    #[error("invalid tile range {min} to {max} resuming at {resume}: {reason}")]
    InvalidRange {
        /// Top-left corner.
        min: TileCoordinate,
        /// Bottom-right corner.
        max: TileCoordinate,
        /// First tile to fetch.
        resume: TileCoordinate,
        /// Which rule was broken.
        reason: &'static str,
    },

    /// A mirror URL cannot host tiles.
    #[error("invalid tile server '{url}': {reason}")]
    InvalidServer {
        /// The rejected server.
        url: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// The tile could not be fetched from the selected mirror.
    #[error("tile {coordinate}: {source}")]
    Fetch {
        /// The tile that failed.
        coordinate: TileCoordinate,
        /// The fetch failure.
        #[source]
        source: FetchError,
    },

    /// The tile was fetched but could not be written.
    #[error("tile {coordinate}: {source}")]
    Persist {
        /// The tile that failed.
        coordinate: TileCoordinate,
        /// The write failure.
        #[source]
        source: PersistError,
    },
}

impl TileError {
    /// Creates an invalid-range error.
    pub fn invalid_range(
        min: TileCoordinate,
        max: TileCoordinate,
        resume: TileCoordinate,
        reason: &'static str,
    ) -> Self {
        Self::InvalidRange {
            min,
            max,
            resume,
            reason,
        }
    }

    /// Creates an invalid-server error.
    pub fn invalid_server(url: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidServer {
            url: url.into(),
            reason,
        }
    }

    /// Creates a fetch error for one tile.
    pub fn fetch(coordinate: TileCoordinate, source: FetchError) -> Self {
        Self::Fetch { coordinate, source }
    }

    /// Creates a persist error for one tile.
    pub fn persist(coordinate: TileCoordinate, source: PersistError) -> Self {
        Self::Persist { coordinate, source }
    }

    /// Returns the tile a per-item failure refers to.
    #[must_use]
    pub fn coordinate(&self) -> Option<TileCoordinate> {
        match self {
            Self::Fetch { coordinate, .. } | Self::Persist { coordinate, .. } => Some(*coordinate),
            Self::InvalidZoom { .. } | Self::InvalidRange { .. } | Self::InvalidServer { .. } => {
                None
            }
        }
    }
}
