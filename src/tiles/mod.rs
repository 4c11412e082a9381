//! Slippy-map tile downloads.
//!
//! - [`project`] maps latitude/longitude to a [`TileCoordinate`] (Web Mercator)
//! - [`TileRange`] is a possibly wrap-around rectangle plus a resume point,
//!   walked column by column
//! - [`ServerPool`] picks a mirror per tile, never the same one twice in a row
//! - [`TileDownloader`] fetches and saves each tile as `z/x/y.png`
//!
//! # Example
//!
//! ```no_run
//! use grabbag_core::fetch::{FetchConfig, Fetcher};
//! use grabbag_core::tiles::{LatLon, ServerPool, TileDownloader, Zoom};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(&FetchConfig::default())?;
//! let downloader = TileDownloader::new(fetcher, ServerPool::openstreetmap()?, "tiles");
//! let report = downloader
//!     .download_bounding_box(
//!         Zoom::new(13)?,
//!         LatLon::new(1.5, 103.6),
//!         LatLon::new(1.2, 104.1),
//!         None,
//!     )
//!     .await?;
//! println!("{} tiles", report.completed);
//! # Ok(())
//! # }
//! ```

mod coordinate;
mod downloader;
mod error;
mod range;
mod servers;

pub use coordinate::{LatLon, MAX_ZOOM, TileCoordinate, Zoom, project};
pub use downloader::{ItemPolicy, TileDownloader, TileReport};
pub use error::TileError;
pub use range::{TileIter, TileRange};
pub use servers::{OPENSTREETMAP_SERVERS, Rotation, ServerPool};
