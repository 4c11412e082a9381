//! Rectangular tile ranges that may wrap across the antimeridian.
//!
//! A range is walked column by column. Each column runs `y` from `min.y` to
//! `max.y`; columns advance `x` modulo `2^zoom` until `max.x` has been
//! visited. The first column starts at the resume coordinate instead of the
//! top-left corner. `min.x > max.x` means the x-range wraps (`5, 6, 7, 0, 1, 2`
//! at zoom 3); `min.x == max.x` is a single column.
//!
//! The walk order is deterministic, so resuming from any coordinate the
//! traversal produced yields exactly the remaining suffix.

use std::iter::FusedIterator;

use super::{LatLon, TileCoordinate, TileError, Zoom};

/// A validated range plus the coordinate to start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRange {
    min: TileCoordinate,
    max: TileCoordinate,
    resume: TileCoordinate,
}

impl TileRange {
    /// Validates a range. Without `resume` the walk starts at `min`.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidRange`] when the corners or the resume
    /// coordinate differ in zoom, or when `resume` lies outside the range.
    pub fn new(
        min: TileCoordinate,
        max: TileCoordinate,
        resume: Option<TileCoordinate>,
    ) -> Result<Self, TileError> {
        let resume = resume.unwrap_or(min);
        let reject = |reason| Err(TileError::invalid_range(min, max, resume, reason));

        if min.zoom() != max.zoom() || resume.zoom() != min.zoom() {
            return reject("corners and resume point must share one zoom level");
        }
        if !(min.y() <= resume.y() && resume.y() <= max.y()) {
            return reject("resume y outside y range");
        }
        if !x_in_range(resume.x(), min.x(), max.x()) {
            return reject("resume x outside x range");
        }

        Ok(Self { min, max, resume })
    }

    /// Every tile at `zoom`.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidRange`] if `resume` is at another zoom.
    pub fn whole_grid(zoom: Zoom, resume: Option<TileCoordinate>) -> Result<Self, TileError> {
        let last = zoom.tiles_per_side() - 1;
        Self::new(
            TileCoordinate::new(zoom, 0, 0),
            TileCoordinate::new(zoom, last, last),
            resume,
        )
    }

    /// Tiles covering the box between two corners.
    ///
    /// `top_left` has the larger latitude. A box whose left longitude is east
    /// of its right longitude wraps across the antimeridian.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidRange`] if the corners are swapped in
    /// latitude or `resume` lies outside the box.
    pub fn bounding_box(
        zoom: Zoom,
        top_left: LatLon,
        bottom_right: LatLon,
        resume: Option<TileCoordinate>,
    ) -> Result<Self, TileError> {
        Self::new(top_left.to_tile(zoom), bottom_right.to_tile(zoom), resume)
    }

    #[must_use]
    pub fn min(&self) -> TileCoordinate {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> TileCoordinate {
        self.max
    }

    #[must_use]
    pub fn resume(&self) -> TileCoordinate {
        self.resume
    }

    #[must_use]
    pub fn zoom(&self) -> Zoom {
        self.min.zoom()
    }

    /// True when the x-range crosses the `2^zoom` boundary.
    #[must_use]
    pub fn wraps(&self) -> bool {
        self.min.x() > self.max.x()
    }

    /// True when `tile` lies inside the rectangle (ignoring the resume point).
    #[must_use]
    pub fn contains(&self, tile: &TileCoordinate) -> bool {
        tile.zoom() == self.zoom()
            && self.min.y() <= tile.y()
            && tile.y() <= self.max.y()
            && x_in_range(tile.x(), self.min.x(), self.max.x())
    }

    /// Number of tiles the walk visits, starting from the resume point.
    #[must_use]
    pub fn tile_count(&self) -> u64 {
        remaining_from(self.resume, self.min, self.max)
    }

    /// Starts the walk at the resume point.
    #[must_use]
    pub fn iter(&self) -> TileIter {
        TileIter {
            next: Some(self.resume),
            min: self.min,
            max: self.max,
        }
    }
}

impl IntoIterator for &TileRange {
    type Item = TileCoordinate;
    type IntoIter = TileIter;

    fn into_iter(self) -> TileIter {
        self.iter()
    }
}

/// Lazy walk over a [`TileRange`].
#[derive(Debug, Clone)]
pub struct TileIter {
    next: Option<TileCoordinate>,
    min: TileCoordinate,
    max: TileCoordinate,
}

impl Iterator for TileIter {
    type Item = TileCoordinate;

    fn next(&mut self) -> Option<TileCoordinate> {
        let current = self.next?;
        self.next = self.successor(current);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self
            .next
            .map_or(0, |next| remaining_from(next, self.min, self.max));
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl FusedIterator for TileIter {}

impl TileIter {
    fn successor(&self, current: TileCoordinate) -> Option<TileCoordinate> {
        let zoom = current.zoom();
        if current.y() < self.max.y() {
            Some(TileCoordinate::new(zoom, current.x(), current.y() + 1))
        } else if current.x() == self.max.x() {
            None
        } else {
            let x = (current.x() + 1) % zoom.tiles_per_side();
            Some(TileCoordinate::new(zoom, x, self.min.y()))
        }
    }
}

fn x_in_range(x: u32, min_x: u32, max_x: u32) -> bool {
    if min_x <= max_x {
        min_x <= x && x <= max_x
    } else {
        x >= min_x || x <= max_x
    }
}

/// Tiles left to visit when `from` is next.
fn remaining_from(from: TileCoordinate, min: TileCoordinate, max: TileCoordinate) -> u64 {
    let n = u64::from(from.zoom().tiles_per_side());
    let column = u64::from(max.y() - min.y()) + 1;
    let first_column = u64::from(max.y() - from.y()) + 1;
    let later_columns = (u64::from(max.x()) + n - u64::from(from.x())) % n;
    first_column + later_columns * column
}
