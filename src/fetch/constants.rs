//! Constants for the fetch module (timeouts, politeness, sniffing).

use std::time::Duration;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default HTTP read timeout (5 minutes for large files).
pub const READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Default pause after every fetch (1.5 seconds).
pub const DEFAULT_DELAY: Duration = Duration::from_millis(1500);

/// Number of leading body bytes inspected for content sniffing.
pub const SNIFF_LEN: usize = 32;
