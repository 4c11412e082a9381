//! Shared User-Agent strings for fetch traffic.
//!
//! Tile mirrors ask bulk clients to identify themselves, so the default UA
//! names the tool and its version. Some comic hosts only serve browsers; those
//! callers switch to [`BROWSER_USER_AGENT`].

/// Project URL for User-Agent identification.
const PROJECT_UA_URL: &str = "https://github.com/fierce/grabbag";

/// Browser User-Agent for hosts that reject non-browser clients.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";

/// Default User-Agent for fetch requests (identifies the tool).
#[must_use]
pub(crate) fn default_user_agent() -> String {
    let version = env!("CARGO_PKG_VERSION");
    format!("grabbag/{version} (+{PROJECT_UA_URL})")
}
