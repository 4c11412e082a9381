//! Uniform politeness pause applied after every fetch.
//!
//! The [`Throttle`] is separate from the [`RetryPolicy`](super::RetryPolicy):
//! the retry budget decides how many round trips one fetch may make, the
//! throttle decides how fast fetches follow each other.
//! Either can be tuned or disabled on its own.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use grabbag_core::fetch::Throttle;
//!
//! # async fn example() {
//! let throttle = Throttle::new(Duration::from_millis(1500));
//! throttle.pause().await; // sleeps 1.5s
//!
//! Throttle::disabled().pause().await; // returns at once
//! # }
//! ```

use std::time::Duration;

use tracing::{debug, instrument};

use super::constants::DEFAULT_DELAY;

/// Fixed delay paid once per fetch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Throttle {
    delay: Duration,
}

impl Default for Throttle {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl Throttle {
    /// Creates a throttle that pauses for `delay` after each fetch.
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Creates a throttle that never pauses.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            delay: Duration::ZERO,
        }
    }

    /// Returns the configured delay.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Returns whether pausing is disabled.
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.delay.is_zero()
    }

    /// Sleeps for the configured delay.
    #[instrument(level = "trace", skip(self), fields(delay_ms = self.delay.as_millis()))]
    pub async fn pause(&self) {
        if self.is_disabled() {
            return;
        }
        debug!("politeness pause");
        tokio::time::sleep(self.delay).await;
    }
}
