//! Bounded retry for transient fetch failures.
//!
//! This module provides the [`RetryPolicy`] and [`FailureType`] types for
//! classifying attempt errors and deciding whether another attempt is made.
//!
//! # Overview
//!
//! When an attempt fails, the error is classified into a [`FailureType`]:
//! - [`FailureType::Transient`] - timeouts, connection errors and failing
//!   HTTP statuses; retried while the budget lasts
//! - [`FailureType::Permanent`] - unresolvable hosts and TLS failures; the
//!   fetch fails at once
//!
//! Retries are not spaced by a backoff multiplier. Pacing is the job of the
//! [`Throttle`](super::Throttle), which runs once per fetch.
//!
//! # Example
//!
//! ```
//! use grabbag_core::fetch::{AttemptError, RetryDecision, RetryPolicy, classify_error};
//!
//! let policy = RetryPolicy::default();
//! let error = AttemptError::http_status("https://example.com/1.png", 503);
//!
//! match policy.should_retry(classify_error(&error), 1) {
//!     RetryDecision::Retry { attempt } => println!("attempt {attempt} next"),
//!     RetryDecision::DoNotRetry { reason } => println!("not retrying: {reason}"),
//! }
//! ```

use tracing::{debug, instrument};

use super::AttemptError;

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Classification of attempt failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Temporary failure that may succeed on retry.
    ///
    /// Examples: read timeout, connection refused, HTTP 404 or 503.
    Transient,

    /// Failure that won't succeed regardless of retries.
    ///
    /// Examples: host does not resolve, certificate rejected.
    Permanent,
}

/// Decision on whether to make another attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Make another attempt.
    Retry {
        /// Which attempt number comes next (1-indexed, so first retry is attempt 2).
        attempt: u32,
    },

    /// Stop and report the failure.
    DoNotRetry {
        /// Human-readable reason why no retry is attempted.
        reason: String,
    },
}

/// Configuration for retry behavior.
///
/// `max_retries` counts additional attempts: a policy with `max_retries = 3`
/// makes at most four round trips per fetch, and `max_retries = 0` gives up
/// after the first transient failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl RetryPolicy {
    /// Creates a policy allowing `max_retries` retries after the first attempt.
    #[must_use]
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries }
    }

    /// Returns the configured number of retries.
    #[must_use]
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the maximum number of attempts (first attempt plus retries).
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Determines whether to retry after a failed attempt.
    ///
    /// # Arguments
    ///
    /// * `failure_type` - Classification of the failure
    /// * `attempt` - The attempt number that just failed (1-indexed)
    #[instrument(skip(self), fields(max_retries = self.max_retries))]
    pub fn should_retry(&self, failure_type: FailureType, attempt: u32) -> RetryDecision {
        if failure_type == FailureType::Permanent {
            return RetryDecision::DoNotRetry {
                reason: "permanent failure - retry would not help".to_string(),
            };
        }

        if attempt >= self.max_attempts() {
            debug!(attempt, max = self.max_attempts(), "retry budget spent");
            return RetryDecision::DoNotRetry {
                reason: format!("max retries ({}) exhausted", self.max_retries),
            };
        }

        debug!(attempt, next_attempt = attempt + 1, "will retry");
        RetryDecision::Retry {
            attempt: attempt + 1,
        }
    }
}

/// Classifies an attempt error for retry decisions.
///
/// | Error | Type | Rationale |
/// |-------|------|-----------|
/// | Timeout | Transient | Network may recover |
/// | HttpStatus (any) | Transient | Mirrors and comic CDNs fail intermittently |
/// | Network (most) | Transient | Server may come back |
/// | Network (TLS) | Permanent | Certificate/config issue |
/// | Unresolvable | Permanent | Host does not exist |
#[instrument]
pub fn classify_error(error: &AttemptError) -> FailureType {
    match error {
        AttemptError::Timeout { .. } | AttemptError::HttpStatus { .. } => FailureType::Transient,

        AttemptError::Network { source, .. } => {
            if is_tls_error(source) {
                FailureType::Permanent
            } else {
                FailureType::Transient
            }
        }

        AttemptError::Unresolvable { .. } => FailureType::Permanent,
    }
}

/// Checks if a reqwest error is a TLS/certificate error.
fn is_tls_error(error: &reqwest::Error) -> bool {
    let error_string = error.to_string().to_lowercase();
    error_string.contains("certificate")
        || error_string.contains("tls")
        || error_string.contains("ssl")
        || error_string.contains("handshake")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    // ==================== RetryPolicy Tests ====================

    #[test]
    fn test_retry_policy_default_values() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries(), 3);
        assert_eq!(policy.max_attempts(), 4);
    }

    #[test]
    fn test_retry_policy_zero_retries_means_single_attempt() {
        let policy = RetryPolicy::with_max_retries(0);
        assert_eq!(policy.max_attempts(), 1);
        let decision = policy.should_retry(FailureType::Transient, 1);
        assert!(matches!(decision, RetryDecision::DoNotRetry { .. }));
    }

    #[test]
    fn test_retry_policy_max_attempts_saturates() {
        let policy = RetryPolicy::with_max_retries(u32::MAX);
        assert_eq!(policy.max_attempts(), u32::MAX);
    }

    // ==================== Should Retry Decision Tests ====================

    #[test]
    fn test_should_retry_permanent_does_not_retry() {
        let policy = RetryPolicy::default();
        let decision = policy.should_retry(FailureType::Permanent, 1);
        if let RetryDecision::DoNotRetry { reason } = decision {
            assert!(reason.contains("permanent"));
        } else {
            panic!("expected DoNotRetry, got {decision:?}");
        }
    }

    #[test]
    fn test_should_retry_transient_retries() {
        let policy = RetryPolicy::default();
        let decision = policy.should_retry(FailureType::Transient, 1);
        assert_eq!(decision, RetryDecision::Retry { attempt: 2 });
    }

    #[test]
    fn test_should_retry_allows_exactly_max_retries_additional_attempts() {
        let policy = RetryPolicy::with_max_retries(3);

        for attempt in 1..=3 {
            let decision = policy.should_retry(FailureType::Transient, attempt);
            assert_eq!(
                decision,
                RetryDecision::Retry {
                    attempt: attempt + 1
                }
            );
        }

        let decision = policy.should_retry(FailureType::Transient, 4);
        if let RetryDecision::DoNotRetry { reason } = decision {
            assert!(reason.contains("exhausted"));
        } else {
            panic!("expected DoNotRetry, got {decision:?}");
        }
    }

    // ==================== Error Classification Tests ====================

    #[test]
    fn test_classify_http_404_transient() {
        let error = AttemptError::http_status("http://example.com", 404);
        assert_eq!(classify_error(&error), FailureType::Transient);
    }

    #[test]
    fn test_classify_http_503_transient() {
        let error = AttemptError::http_status("http://example.com", 503);
        assert_eq!(classify_error(&error), FailureType::Transient);
    }

    #[test]
    fn test_classify_timeout_transient() {
        let error = AttemptError::timeout("http://example.com");
        assert_eq!(classify_error(&error), FailureType::Transient);
    }

    #[test]
    fn test_classify_unresolvable_permanent() {
        let error = AttemptError::unresolvable("http://nowhere.invalid", "dns error");
        assert_eq!(classify_error(&error), FailureType::Permanent);
    }

    #[test]
    fn test_default_max_retries_constant() {
        assert_eq!(DEFAULT_MAX_RETRIES, 3);
    }
}
