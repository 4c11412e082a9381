//! The fetcher: GET with bounded retry and a politeness pause.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::body::{FetchBody, FetchResult};
use super::constants::{CONNECT_TIMEOUT, READ_TIMEOUT};
use super::error::{AttemptError, FetchError};
use super::page::Page;
use super::retry::{FailureType, RetryDecision, RetryPolicy, classify_error};
use super::throttle::Throttle;
use crate::user_agent;

/// Settings applied to every fetch made by one [`Fetcher`].
///
/// # Default Values
///
/// - `retry_policy`: 3 retries
/// - `throttle`: 1500 ms
/// - `connect_timeout`: 30 seconds
/// - `read_timeout`: 5 minutes
/// - `user_agent`: tool identifier
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// How many times a transient failure is retried.
    pub retry_policy: RetryPolicy,
    /// Pause paid once per fetch.
    pub throttle: Throttle,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Whole-request timeout.
    pub read_timeout: Duration,
    /// User-Agent header; `None` uses the tool identifier.
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            throttle: Throttle::default(),
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            user_agent: None,
        }
    }
}

impl FetchConfig {
    /// Returns a copy with a different retry budget.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry_policy = RetryPolicy::with_max_retries(max_retries);
        self
    }

    /// Returns a copy with a different politeness delay.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.throttle = Throttle::new(delay);
        self
    }

    /// Returns a copy with a different read timeout.
    #[must_use]
    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }
}

/// HTTP fetcher shared by the scrapers and the tile downloader.
///
/// Created once and reused, so connections and cookies (some comic hosts set
/// session cookies on their landing page) carry across fetches.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    retry_policy: RetryPolicy,
    throttle: Throttle,
}

impl Fetcher {
    /// Creates a fetcher from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = base_client_builder(config)
            .build()
            .map_err(|source| FetchError::Client { source })?;
        Ok(Self {
            client,
            retry_policy: config.retry_policy.clone(),
            throttle: config.throttle,
        })
    }

    /// Returns the retry policy applied to each fetch.
    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the throttle applied after each fetch.
    #[must_use]
    pub fn throttle(&self) -> Throttle {
        self.throttle
    }

    /// Issues a GET for `url`, retrying transient failures.
    ///
    /// The politeness pause runs once before returning, on success and on
    /// exhaustion alike. URLs rejected before any network activity return
    /// without pausing.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Invalid`] for malformed or non-HTTP URLs and for
    ///   permanent failures such as unresolvable hosts
    /// - [`FetchError::Exhausted`] once `max_retries` retries have failed
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch(&self, url: &str) -> Result<FetchResult, FetchError> {
        let parsed = parse_fetch_url(url)?;
        info!("grabbing");

        let outcome = self.fetch_with_retry(&parsed).await;
        self.throttle.pause().await;
        outcome
    }

    /// Fetches `url` and decodes the body as page text.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`fetch`](Self::fetch).
    #[instrument(skip(self), fields(url = %url))]
    pub async fn fetch_page(&self, url: &str) -> Result<Page, FetchError> {
        let result = self.fetch(url).await?;
        let html = result.body.text();
        Ok(Page::new(result.final_url, html))
    }

    async fn fetch_with_retry(&self, url: &Url) -> Result<FetchResult, FetchError> {
        let mut attempt: u32 = 1;
        loop {
            let error = match self.attempt(url).await {
                Ok(result) => {
                    debug!(attempt, status = result.status, "fetched");
                    return Ok(result);
                }
                Err(error) => error,
            };

            let failure_type = classify_error(&error);
            match self.retry_policy.should_retry(failure_type, attempt) {
                RetryDecision::Retry { attempt: next } => {
                    warn!(attempt, error = %error, "attempt failed, retrying");
                    attempt = next;
                }
                RetryDecision::DoNotRetry { reason } => {
                    warn!(attempt, error = %error, %reason, "giving up");
                    return Err(match failure_type {
                        FailureType::Permanent => FetchError::invalid(url.as_str(), error.to_string()),
                        FailureType::Transient => FetchError::exhausted(url.as_str(), attempt, error),
                    });
                }
            }
        }
    }

    /// One network round trip, body included.
    ///
    /// A body that times out or breaks off fails the attempt the same way a
    /// failed connect does.
    async fn attempt(&self, url: &Url) -> Result<FetchResult, AttemptError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AttemptError::from_reqwest(url.as_str(), e))?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(AttemptError::http_status(url.as_str(), status.as_u16()));
        }

        let final_url = response.url().clone();
        let body = FetchBody::read(response)
            .await
            .map_err(|e| AttemptError::from_reqwest(url.as_str(), e))?;
        debug!(bytes = body.len(), "body received");

        Ok(FetchResult {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

fn parse_fetch_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::invalid(url, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::invalid(
            url,
            format!("unsupported scheme '{other}'"),
        )),
    }
}

fn base_client_builder(config: &FetchConfig) -> ClientBuilder {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(user_agent::default_user_agent);
    Client::builder()
        .connect_timeout(config.connect_timeout)
        .timeout(config.read_timeout)
        .gzip(true)
        .cookie_store(true)
        .user_agent(user_agent)
}
