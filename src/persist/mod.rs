//! Writing fetched bodies to disk.
//!
//! Every write is a two-phase commit: the body is written to a hidden staging
//! file next to the target (`.name.part`), and a single rename publishes it
//! under its final name. Readers of the output directory never see a
//! half-written or provisionally named file; an interrupted run leaves at most
//! a `.part` file behind, which the next run overwrites.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use grabbag_core::fetch::{FetchConfig, Fetcher};
//! use grabbag_core::persist;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let fetcher = Fetcher::new(&FetchConfig::default())?;
//! let result = fetcher.fetch("https://img.example/chapter-1/001").await?;
//! let (path, _) =
//!     persist::save_with_guessed_extension(result.body, Path::new("out"), "1", "/chapter-1/001")
//!         .await?;
//! println!("saved {}", path.display());
//! # Ok(())
//! # }
//! ```

mod error;
mod filename;

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

use crate::content::{self, Classification};
use crate::fetch::{FetchBody, SNIFF_LEN};

pub use error::PersistError;
pub use filename::{original_name, sequential_name};

/// Writes `body` to `dir/filename`, creating missing parent directories.
///
/// `filename` may be a relative path (`13/6420/4063.png`); intermediate
/// directories are created as needed.
///
/// # Errors
///
/// Returns [`PersistError::Io`] on any filesystem failure. The staging file
/// is removed on failure.
#[instrument(skip(body), fields(url = body.url()))]
pub async fn save(body: FetchBody, dir: &Path, filename: &Path) -> Result<PathBuf, PersistError> {
    let target = dir.join(filename);
    let staging = stage(&body, &target).await?;
    commit(&staging, &target).await?;
    debug!(path = %target.display(), "saved");
    Ok(target)
}

/// Writes `body` to `dir/{stem}.{ext}`, deciding `ext` from the content.
///
/// The leading [`SNIFF_LEN`] bytes are sniffed. For image signatures the full
/// body is handed to the image decoders' format detection. When nothing
/// matches, the extension of `url_path` is used.
///
/// # Errors
///
/// Same as [`save`].
#[instrument(skip(body), fields(url = body.url()))]
pub async fn save_with_guessed_extension(
    body: FetchBody,
    dir: &Path,
    stem: &str,
    url_path: &str,
) -> Result<(PathBuf, Classification), PersistError> {
    let sniffed = content::sniff(body.peek(SNIFF_LEN));
    let classification = content::decide(
        sniffed,
        || content::image_extension(body.as_bytes()),
        url_path,
    );

    let provisional = dir.join(sequential_name(stem, ""));
    let staging = stage(&body, &provisional).await?;

    let target = dir.join(sequential_name(stem, &classification.extension));
    commit(&staging, &target).await?;
    debug!(path = %target.display(), extension = %classification.extension, "saved");
    Ok((target, classification))
}

/// Writes the body into the staging file for `target`.
async fn stage(body: &FetchBody, target: &Path) -> Result<PathBuf, PersistError> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .await
        .map_err(|e| PersistError::io(parent, e))?;

    let final_name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = parent.join(filename::staging_name(&final_name));

    let file = File::create(&staging)
        .await
        .map_err(|e| PersistError::io(&staging, e))?;

    let result = write_file(file, body.as_bytes(), &staging).await;
    if result.is_err() {
        debug!(path = %staging.display(), "cleaning up staging file after error");
        let _ = fs::remove_file(&staging).await;
    }
    result?;
    debug!(path = %staging.display(), bytes = body.len(), "staged");
    Ok(staging)
}

/// Publishes the staging file under its final name.
async fn commit(staging: &Path, target: &Path) -> Result<(), PersistError> {
    if let Err(e) = fs::rename(staging, target).await {
        let _ = fs::remove_file(staging).await;
        return Err(PersistError::io(target, e));
    }
    Ok(())
}

async fn write_file(mut file: File, bytes: &[u8], path: &Path) -> Result<(), PersistError> {
    file.write_all(bytes)
        .await
        .map_err(|e| PersistError::io(path, e))?;
    file.flush().await.map_err(|e| PersistError::io(path, e))
}
