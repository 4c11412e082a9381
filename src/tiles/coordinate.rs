//! Slippy-map tile coordinates and the Web Mercator projection.

use std::f64::consts::PI;
use std::fmt;
use std::path::PathBuf;

use super::TileError;

/// Highest zoom level tile servers publish.
pub const MAX_ZOOM: u8 = 19;

/// A validated zoom level in `0..=MAX_ZOOM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Zoom(u8);

impl Zoom {
    /// Validates a zoom level.
    ///
    /// # Errors
    ///
    /// Returns [`TileError::InvalidZoom`] above [`MAX_ZOOM`].
    pub fn new(zoom: u8) -> Result<Self, TileError> {
        if zoom > MAX_ZOOM {
            return Err(TileError::InvalidZoom { zoom });
        }
        Ok(Self(zoom))
    }

    /// Returns the raw zoom level.
    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }

    /// Number of tiles along each axis (`2^zoom`).
    #[must_use]
    pub fn tiles_per_side(self) -> u32 {
        1 << self.0
    }
}

impl fmt::Display for Zoom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One tile at a fixed zoom. `x` and `y` are always inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    zoom: Zoom,
    x: u32,
    y: u32,
}

impl TileCoordinate {
    /// Creates a coordinate, reducing `x` and `y` modulo `2^zoom`.
    #[must_use]
    pub fn new(zoom: Zoom, x: u32, y: u32) -> Self {
        let n = zoom.tiles_per_side();
        Self {
            zoom,
            x: x % n,
            y: y % n,
        }
    }

    #[must_use]
    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    #[must_use]
    pub fn x(&self) -> u32 {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> u32 {
        self.y
    }

    /// On-disk location below the output directory: `z/x/y.png`.
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.zoom.to_string())
            .join(self.x.to_string())
            .join(format!("{}.png", self.y))
    }

    /// Geographic center of the tile.
    #[must_use]
    pub fn center(&self) -> LatLon {
        let n = f64::from(self.zoom.tiles_per_side());
        let lon = (f64::from(self.x) + 0.5) / n * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * (f64::from(self.y) + 0.5) / n))
            .sinh()
            .atan()
            .to_degrees();
        LatLon::new(lat, lon)
    }
}

impl fmt::Display for TileCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// A point in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Tile containing this point at `zoom`.
    #[must_use]
    pub fn to_tile(self, zoom: Zoom) -> TileCoordinate {
        project(zoom, self.lat, self.lon)
    }
}

/// Projects a point onto the tile grid at `zoom`.
///
/// Out-of-range input saturates: latitudes past the Mercator limit
/// (±85.0511°) land on the first or last row, longitudes outside ±180 on the
/// first or last column. `NaN` maps to index 0.
#[must_use]
pub fn project(zoom: Zoom, lat: f64, lon: f64) -> TileCoordinate {
    let n = f64::from(zoom.tiles_per_side());
    let lat_rad = lat.to_radians();

    let x = (lon + 180.0) / 360.0 * n;
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n;

    TileCoordinate {
        zoom,
        x: clamp_index(x, zoom),
        y: clamp_index(y, zoom),
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn clamp_index(value: f64, zoom: Zoom) -> u32 {
    let last = zoom.tiles_per_side() - 1;
    let floored = value.floor();
    if floored.is_nan() || floored < 0.0 {
        0
    } else if floored >= f64::from(last) {
        last
    } else {
        floored as u32
    }
}
