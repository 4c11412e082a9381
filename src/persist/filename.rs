//! Filename strategies used when persisting fetched resources.
//!
//! - "original name": the URL-decoded last path segment, or the whole decoded
//!   path when nested originals should be kept (tiles keep `z/x/y.png`)
//! - "sequential name": a caller-supplied stem plus a sniffed extension

use std::path::{Component, Path, PathBuf};

use url::Url;

use super::PersistError;

/// Derives the on-disk name for a URL from its decoded path.
///
/// With `with_path` the result keeps every path segment (`/a/b/c.jpg` →
/// `a/b/c.jpg`); otherwise only the last segment is used.
///
/// # Errors
///
/// - [`PersistError::MissingFilename`] when the path ends without a segment
/// - [`PersistError::UnsafePath`] when a decoded segment is `.` or `..`
pub fn original_name(url: &Url, with_path: bool) -> Result<PathBuf, PersistError> {
    let segments: Vec<String> = url
        .path_segments()
        .map(|segments| {
            segments
                .map(|segment| {
                    urlencoding::decode(segment)
                        .map_or_else(|_| segment.to_string(), |decoded| decoded.into_owned())
                })
                .collect()
        })
        .unwrap_or_default();

    let Some(last) = segments.last().filter(|s| !s.is_empty()) else {
        return Err(PersistError::missing_filename(url.as_str()));
    };

    let kept: Vec<&String> = if with_path {
        segments.iter().filter(|s| !s.is_empty()).collect()
    } else {
        vec![last]
    };

    let mut relative = PathBuf::new();
    for segment in kept {
        if !is_safe_filename_segment(segment) {
            return Err(PersistError::unsafe_path(url.as_str(), segments.join("/")));
        }
        relative.push(sanitize_filename(segment));
    }
    Ok(relative)
}

/// Builds `{stem}.{extension}`, or the bare stem when the extension is empty.
#[must_use]
pub fn sequential_name(stem: &str, extension: &str) -> String {
    let stem = sanitize_filename(stem);
    if extension.is_empty() {
        stem
    } else {
        format!("{stem}.{extension}")
    }
}

/// Sanitizes filename for filesystem safety.
///
/// Replaces characters that are invalid on common filesystems:
/// / \ : * ? " < > |
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.is_empty() {
        return "_".to_string();
    }

    if is_safe_filename_segment(&sanitized) {
        sanitized
    } else {
        sanitized
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect()
    }
}

/// Name of the staging file written before the final rename.
pub(crate) fn staging_name(final_name: &str) -> String {
    format!(".{final_name}.part")
}

fn is_safe_filename_segment(name: &str) -> bool {
    !Path::new(name).components().any(|component| {
        matches!(
            component,
            Component::CurDir | Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    })
}
