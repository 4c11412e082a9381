//! Error types for the fetch module.
//!
//! [`AttemptError`] describes one failed round trip; [`FetchError`] is what a
//! caller of [`Fetcher::fetch`](super::Fetcher::fetch) sees once the retry
//! budget has been applied.

use std::error::Error as StdError;

use thiserror::Error;

/// A single failed request attempt.
#[derive(Debug, Error)]
pub enum AttemptError {
    /// Connection-level error (refused, reset, TLS, body decoding, etc.)
    #[error("network error fetching {url}: {source}")]
    Network {
        /// The URL being fetched.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Connect or read timed out.
    #[error("timeout fetching {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Server answered with a status outside 2xx/3xx.
    #[error("HTTP {status} fetching {url}")]
    HttpStatus {
        /// The URL that returned a failing status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// Host name could not be resolved.
    #[error("cannot resolve host for {url}: {detail}")]
    Unresolvable {
        /// The URL whose host failed to resolve.
        url: String,
        /// Resolver message.
        detail: String,
    },
}

impl AttemptError {
    /// Creates a network error from a reqwest error.
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Network {
            url: url.into(),
            source,
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a host resolution error.
    pub fn unresolvable(url: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Unresolvable {
            url: url.into(),
            detail: detail.into(),
        }
    }

    /// Maps a reqwest send or body error onto the matching attempt error.
    pub(crate) fn from_reqwest(url: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::timeout(url)
        } else if let Some(detail) = dns_failure_detail(&error) {
            Self::unresolvable(url, detail)
        } else {
            Self::network(url, error)
        }
    }

    /// Returns the HTTP status for status failures.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors returned by [`Fetcher`](super::Fetcher).
#[derive(Debug, Error)]
pub enum FetchError {
    /// Request can never succeed (malformed URL, unsupported scheme, unresolvable host).
    #[error("invalid request for {url}: {reason}")]
    Invalid {
        /// The offending URL.
        url: String,
        /// Why the request was rejected.
        reason: String,
    },

    /// Every allowed attempt failed transiently.
    #[error("giving up on {url} after {attempts} attempt(s): {last_error}")]
    Exhausted {
        /// The URL that could not be fetched.
        url: String,
        /// Attempts made, including the first.
        attempts: u32,
        /// Failure of the final attempt.
        #[source]
        last_error: AttemptError,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {source}")]
    Client {
        /// Builder error.
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    /// Creates an invalid-request error.
    pub fn invalid(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Creates a retries-exhausted error.
    pub fn exhausted(url: impl Into<String>, attempts: u32, last_error: AttemptError) -> Self {
        Self::Exhausted {
            url: url.into(),
            attempts,
            last_error,
        }
    }

    /// Returns the URL the error refers to, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Invalid { url, .. } | Self::Exhausted { url, .. } => Some(url),
            Self::Client { .. } => None,
        }
    }
}

/// Resolver failures surface as connect errors whose chain mentions DNS.
fn dns_failure_detail(error: &reqwest::Error) -> Option<String> {
    if !error.is_connect() {
        return None;
    }
    let mut current: Option<&(dyn StdError + 'static)> = error.source();
    while let Some(cause) = current {
        let message = cause.to_string();
        let lowered = message.to_lowercase();
        if lowered.contains("dns error")
            || lowered.contains("failed to lookup address")
            || lowered.contains("name or service not known")
            || lowered.contains("nodename nor servname")
            || lowered.contains("no such host")
        {
            return Some(message);
        }
        current = cause.source();
    }
    None
}
