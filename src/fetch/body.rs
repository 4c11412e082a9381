//! Response bodies, read in full as part of the attempt that fetched them.

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tracing::trace;
use url::Url;

/// Outcome of a successful fetch.
///
/// Owned by the caller once returned; the fetcher keeps no reference to it.
#[derive(Debug)]
pub struct FetchResult {
    /// URL after redirects.
    pub final_url: Url,
    /// HTTP status of the final response.
    pub status: u16,
    /// Response body, already received in full.
    pub body: FetchBody,
}

impl FetchResult {
    /// Returns whether the final status is 2xx or 3xx.
    #[must_use]
    pub fn ok(&self) -> bool {
        (200..400).contains(&self.status)
    }
}

/// A complete response body.
///
/// The body is read to the end inside the attempt that requested it, so a
/// timeout or reset mid-transfer fails that attempt and is retried like any
/// other transient failure. Once a `FetchBody` exists no network I/O is left.
/// [`peek`](Self::peek) exposes leading bytes for sniffing; the same bytes are
/// written to disk unmodified.
#[derive(Clone, PartialEq, Eq)]
pub struct FetchBody {
    url: String,
    bytes: Bytes,
}

impl std::fmt::Debug for FetchBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchBody")
            .field("url", &self.url)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl FetchBody {
    /// Streams a response body to the end.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self, reqwest::Error> {
        let url = response.url().to_string();
        let mut buffer = BytesMut::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            trace!(bytes = chunk.len(), "body chunk");
            buffer.extend_from_slice(&chunk);
        }
        Ok(Self {
            url,
            bytes: buffer.freeze(),
        })
    }

    /// Creates a body from bytes already in memory.
    pub fn from_bytes(url: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            url: url.into(),
            bytes: bytes.into(),
        }
    }

    /// URL this body was fetched from.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Up to `len` leading bytes; fewer only when the body is shorter.
    #[must_use]
    pub fn peek(&self, len: usize) -> &[u8] {
        &self.bytes[..self.bytes.len().min(len)]
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    #[must_use]
    pub fn into_bytes(self) -> Bytes {
        self.bytes
    }

    /// Decodes the body as text, replacing invalid UTF-8.
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}
