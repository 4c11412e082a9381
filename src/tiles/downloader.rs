//! Drives fetch and persist across a tile range.

use std::path::{Path, PathBuf};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, instrument, warn};

use super::{LatLon, Rotation, ServerPool, TileCoordinate, TileError, TileRange, Zoom};
use crate::fetch::Fetcher;
use crate::persist;

/// What a traversal does when a single tile fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ItemPolicy {
    /// Stop at the first failure and return it.
    #[default]
    Abort,
    /// Record the failure and move on to the next tile.
    SkipAndContinue,
}

/// Outcome of a traversal that ran to the end.
#[derive(Debug, Default)]
pub struct TileReport {
    /// Tiles written.
    pub completed: u64,
    /// Tiles skipped under [`ItemPolicy::SkipAndContinue`], in visit order.
    pub failed: Vec<TileError>,
    /// Last tile written, if any.
    pub last_completed: Option<TileCoordinate>,
}

/// Downloads tiles into `{out_dir}/{z}/{x}/{y}.png`.
///
/// Tiles are fetched strictly one after another in the range's walk order;
/// each fetch pays the fetcher's politeness pause. A tile is on disk before
/// the next one is requested, so an interrupted run can resume from the
/// first tile it did not finish.
#[derive(Debug, Clone)]
pub struct TileDownloader {
    fetcher: Fetcher,
    pool: ServerPool,
    out_dir: PathBuf,
}

impl TileDownloader {
    #[must_use]
    pub fn new(fetcher: Fetcher, pool: ServerPool, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            fetcher,
            pool,
            out_dir: out_dir.into(),
        }
    }

    #[must_use]
    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    #[must_use]
    pub fn pool(&self) -> &ServerPool {
        &self.pool
    }

    /// Downloads every tile at `zoom`, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidRange`] for a resume point at another zoom,
    /// otherwise the first per-tile failure.
    pub async fn download_all(
        &self,
        zoom: Zoom,
        resume: Option<TileCoordinate>,
    ) -> Result<TileReport, TileError> {
        let range = TileRange::whole_grid(zoom, resume)?;
        self.download_range(&range, &mut Rotation::default(), ItemPolicy::Abort)
            .await
    }

    /// Downloads the tiles covering a lat/lon box, stopping at the first
    /// failure.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidRange`] before any network activity when
    /// the box or resume point is inconsistent, otherwise the first per-tile
    /// failure.
    pub async fn download_bounding_box(
        &self,
        zoom: Zoom,
        top_left: LatLon,
        bottom_right: LatLon,
        resume: Option<TileCoordinate>,
    ) -> Result<TileReport, TileError> {
        let range = TileRange::bounding_box(zoom, top_left, bottom_right, resume)?;
        self.download_range(&range, &mut Rotation::default(), ItemPolicy::Abort)
            .await
    }

    /// Downloads `range`, threading mirror selection through `rotation`.
    ///
    /// # Errors
    ///
    /// Under [`ItemPolicy::Abort`] returns the first per-tile failure; its
    /// [`coordinate`](TileError::coordinate) is the resume point.
    pub async fn download_range(
        &self,
        range: &TileRange,
        rotation: &mut Rotation,
        policy: ItemPolicy,
    ) -> Result<TileReport, TileError> {
        self.download_range_with(range, rotation, policy, |_, _| {})
            .await
    }

    /// Like [`download_range`](Self::download_range), reporting each tile to
    /// `observer` as soon as it is written or has failed.
    ///
    /// # Errors
    ///
    /// Same as [`download_range`](Self::download_range).
    #[instrument(
        skip(self, rotation, observer),
        fields(zoom = %range.zoom(), min = %range.min(), max = %range.max(), resume = %range.resume())
    )]
    pub async fn download_range_with<F>(
        &self,
        range: &TileRange,
        rotation: &mut Rotation,
        policy: ItemPolicy,
        mut observer: F,
    ) -> Result<TileReport, TileError>
    where
        F: FnMut(&TileCoordinate, Result<&Path, &TileError>),
    {
        info!(tiles = range.tile_count(), "starting tile download");
        let mut rng = StdRng::from_entropy();
        let mut report = TileReport::default();

        for tile in range {
            match self.download_tile(&tile, rotation, &mut rng).await {
                Ok(path) => {
                    observer(&tile, Ok(&path));
                    report.completed += 1;
                    report.last_completed = Some(tile);
                }
                Err(error) => {
                    observer(&tile, Err(&error));
                    match policy {
                        ItemPolicy::Abort => {
                            warn!(%tile, %error, "aborting tile download");
                            return Err(error);
                        }
                        ItemPolicy::SkipAndContinue => {
                            warn!(%tile, %error, "skipping tile");
                            report.failed.push(error);
                        }
                    }
                }
            }
        }

        info!(
            completed = report.completed,
            failed = report.failed.len(),
            "tile download finished"
        );
        Ok(report)
    }

    async fn download_tile(
        &self,
        tile: &TileCoordinate,
        rotation: &mut Rotation,
        rng: &mut StdRng,
    ) -> Result<PathBuf, TileError> {
        let server = self.pool.select(rotation, rng);
        let url = ServerPool::tile_url(server, tile)?;
        let result = self
            .fetcher
            .fetch(url.as_str())
            .await
            .map_err(|e| TileError::fetch(*tile, e))?;
        persist::save(result.body, &self.out_dir, &tile.relative_path())
            .await
            .map_err(|e| TileError::persist(*tile, e))
    }
}
