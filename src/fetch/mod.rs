//! HTTP fetching with bounded retry and a uniform politeness pause.
//!
//! This module provides the [`Fetcher`], which issues GET requests for the
//! scrapers and the tile downloader. Every call to [`Fetcher::fetch`]:
//!
//! - retries transient failures (timeouts, connection errors, failing HTTP
//!   statuses, bodies that stall or break off) up to [`RetryPolicy::max_retries`] additional times, with no
//!   backoff between attempts
//! - fails immediately on malformed URLs and unresolvable hosts
//! - pays the [`Throttle`] delay exactly once before returning, whatever the
//!   attempt count, so the call rate seen by the server stays uniform
//!
//! # Example
//!
//! ```no_run
//! use grabbag_core::fetch::{FetchConfig, Fetcher};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(&FetchConfig::default())?;
//! let result = fetcher.fetch("https://example.com/page/1").await?;
//! println!("{} -> HTTP {}", result.final_url, result.status);
//! # Ok(())
//! # }
//! ```

mod body;
mod client;
mod constants;
mod error;
mod page;
mod retry;
mod throttle;

pub use body::{FetchBody, FetchResult};
pub use client::{FetchConfig, Fetcher};
pub use constants::{CONNECT_TIMEOUT, DEFAULT_DELAY, READ_TIMEOUT, SNIFF_LEN};
pub use error::{AttemptError, FetchError};
pub use page::Page;
pub use retry::{DEFAULT_MAX_RETRIES, FailureType, RetryDecision, RetryPolicy, classify_error};
pub use throttle::Throttle;
