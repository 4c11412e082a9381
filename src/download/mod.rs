//! Fetch-then-persist helpers shared by the site scrapers.
//!
//! A [`Downloader`] owns one [`Fetcher`] and turns URLs into files:
//!
//! - [`Downloader::download_to_file`] writes to an exact path
//! - [`Downloader::download_original_name`] names the file after the URL path
//! - [`Downloader::download_guess_extension`] names the file `{stem}.{ext}`
//!   with `ext` recovered from the content
//! - [`Downloader::download_batch`] runs one of the two naming strategies over
//!   a list of URLs, in order, stopping at the first failure
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use grabbag_core::download::{Downloader, Naming};
//! use grabbag_core::fetch::{FetchConfig, Fetcher};
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let downloader = Downloader::new(Fetcher::new(&FetchConfig::default())?);
//! let pages = vec![
//!     Url::parse("https://img.example/c/1/001.jpg")?,
//!     Url::parse("https://img.example/c/1/002.jpg")?,
//! ];
//! let report = downloader
//!     .download_batch(&pages, Path::new("chapter-1"), Naming::Sequential { start: 1 })
//!     .await?;
//! println!("{} pages", report.paths.len());
//! # Ok(())
//! # }
//! ```

mod error;

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};
use url::Url;

use crate::content::Classification;
use crate::fetch::{FetchError, Fetcher};
use crate::persist;

pub use error::{BatchError, DownloadError};

/// How a batch names its files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Naming {
    /// Decoded URL path: the last segment, or every segment as nested
    /// directories with `with_path`.
    Original {
        /// Keep intermediate path segments.
        with_path: bool,
    },
    /// `start`, `start + 1`, ... with a sniffed extension.
    Sequential {
        /// Stem of the first item.
        start: u32,
    },
}

/// Files written by a completed batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// One path per input URL.
    pub paths: Vec<PathBuf>,
}

/// Fetches resources and writes them to disk.
#[derive(Debug, Clone)]
pub struct Downloader {
    fetcher: Fetcher,
}

impl Downloader {
    /// Wraps a fetcher.
    #[must_use]
    pub fn new(fetcher: Fetcher) -> Self {
        Self { fetcher }
    }

    /// Returns the underlying fetcher, for page requests.
    #[must_use]
    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    /// Downloads `url` to `path` exactly, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Fetch`] if the fetch fails and
    /// [`DownloadError::Persist`] if the file cannot be written.
    #[instrument(skip(self), fields(url = %url, path = %path.display()))]
    pub async fn download_to_file(&self, url: &str, path: &Path) -> Result<PathBuf, DownloadError> {
        let (dir, name) = split_target(path);
        let result = self.fetcher.fetch(url).await?;
        let saved = persist::save(result.body, dir, name).await?;
        info!(path = %saved.display(), "downloaded");
        Ok(saved)
    }

    /// Downloads `url` into `out_dir` under its original name.
    ///
    /// With `with_path` every decoded path segment is kept, so
    /// `http://host/13/6420/4063.png` lands at `out_dir/13/6420/4063.png`.
    /// The name is derived from the requested URL, not the post-redirect one,
    /// and is checked before any network activity.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Persist`] when the URL has no usable name or
    /// the file cannot be written, and [`DownloadError::Fetch`] when the fetch
    /// fails.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn download_original_name(
        &self,
        url: &str,
        out_dir: &Path,
        with_path: bool,
    ) -> Result<PathBuf, DownloadError> {
        let parsed = parse_url(url)?;
        let name = persist::original_name(&parsed, with_path)?;
        let result = self.fetcher.fetch(url).await?;
        let saved = persist::save(result.body, out_dir, &name).await?;
        info!(path = %saved.display(), "downloaded");
        Ok(saved)
    }

    /// Downloads `url` into `out_dir` as `{stem}.{ext}`.
    ///
    /// The extension comes from the content (markup, XML, image decoders) and
    /// falls back to the extension of the URL path; with no extension at all
    /// the file is saved as the bare stem.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Fetch`] if the fetch fails and
    /// [`DownloadError::Persist`] if the file cannot be written.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn download_guess_extension(
        &self,
        url: &str,
        out_dir: &Path,
        stem: &str,
    ) -> Result<(PathBuf, Classification), DownloadError> {
        let parsed = parse_url(url)?;
        let result = self.fetcher.fetch(url).await?;
        let (saved, classification) =
            persist::save_with_guessed_extension(result.body, out_dir, stem, parsed.path()).await?;
        info!(path = %saved.display(), strategy = ?classification.strategy, "downloaded");
        Ok((saved, classification))
    }

    /// Downloads every URL in order, naming files per `naming`.
    ///
    /// Items run strictly one after another, each paying the fetcher's
    /// politeness pause. The first failure aborts the batch; files already
    /// written stay in place.
    ///
    /// # Errors
    ///
    /// Returns [`BatchError`] carrying the failing index and the number of
    /// items completed before it.
    #[instrument(skip(self, urls), fields(count = urls.len(), out_dir = %out_dir.display()))]
    pub async fn download_batch(
        &self,
        urls: &[Url],
        out_dir: &Path,
        naming: Naming,
    ) -> Result<BatchReport, BatchError> {
        let mut report = BatchReport::default();

        for (index, url) in urls.iter().enumerate() {
            let outcome = match naming {
                Naming::Original { with_path } => {
                    self.download_original_name(url.as_str(), out_dir, with_path)
                        .await
                }
                Naming::Sequential { start } => {
                    let stem = sequence_stem(start, index);
                    self.download_guess_extension(url.as_str(), out_dir, &stem)
                        .await
                        .map(|(path, _)| path)
                }
            };

            match outcome {
                Ok(path) => report.paths.push(path),
                Err(source) => {
                    warn!(index, url = %url, error = %source, "batch aborted");
                    return Err(BatchError {
                        index,
                        url: url.to_string(),
                        completed: report.paths.len(),
                        source,
                    });
                }
            }
        }

        Ok(report)
    }
}

fn parse_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::invalid(url, e.to_string()))
}

/// Splits a target path into the directory to create and the file name.
fn split_target(path: &Path) -> (&Path, &Path) {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => (parent, Path::new(name)),
        _ => (Path::new(""), path),
    }
}

fn sequence_stem(start: u32, index: usize) -> String {
    (u64::from(start) + index as u64).to_string()
}
