//! Grabbag Core Library
//!
//! This library provides the shared engine behind a set of site scrapers
//! (comic chapter downloaders, a soundtrack downloader) and a slippy-map
//! tile downloader: fetch many remote resources over an unreliable network,
//! stay polite towards the target server, and persist them under
//! predictable names.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`fetch`] - HTTP GET with bounded retry and a uniform politeness pause
//! - [`content`] - Content sniffing to recover a body's true extension
//! - [`persist`] - Two-phase writes of response bodies to disk
//! - [`download`] - Fetch-then-persist helpers shared by the scrapers
//! - [`tiles`] - Web Mercator projection and wrap-around tile traversal
//!
//! Site-specific scraping (locating image links, following next-page
//! anchors) lives with the caller; it hands URLs to [`download::Downloader`]
//! and receives paths or page text back.

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod content;
pub mod download;
pub mod fetch;
pub mod persist;
pub mod tiles;
mod user_agent;

// Re-export commonly used types
pub use content::{Classification, Strategy, classify};
pub use download::{BatchError, BatchReport, DownloadError, Downloader, Naming};
pub use fetch::{
    AttemptError, DEFAULT_DELAY, DEFAULT_MAX_RETRIES, FailureType, FetchBody, FetchConfig,
    FetchError, FetchResult, Fetcher, Page, RetryDecision, RetryPolicy, Throttle, classify_error,
};
pub use persist::PersistError;
pub use tiles::{
    ItemPolicy, LatLon, Rotation, ServerPool, TileCoordinate, TileDownloader, TileError,
    TileRange, TileReport, Zoom, project,
};
pub use user_agent::BROWSER_USER_AGENT;
