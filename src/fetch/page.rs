//! Fetched pages handed to site-specific scrapers.

use regex::Regex;
use tracing::debug;
use url::Url;

/// A page body decoded as text, with the URLs needed to resolve its links.
#[derive(Debug, Clone)]
pub struct Page {
    /// URL after redirects.
    pub final_url: Url,
    /// `scheme://authority/` of the final URL.
    ///
    /// Not used by [`resolve`](Self::resolve), which joins against
    /// `final_url`. Scrapers that assemble links from site-root paths pulled
    /// out of scripts join them here, so a redirect to a mirror host is
    /// followed.
    pub base_url: Url,
    /// Decoded body.
    pub html: String,
}

impl Page {
    /// Wraps page text fetched from `final_url`.
    #[must_use]
    pub fn new(final_url: Url, html: String) -> Self {
        let base_url = document_base(&final_url);
        Self {
            final_url,
            base_url,
            html,
        }
    }

    /// Resolves a link found on the page into an absolute URL.
    #[must_use]
    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.final_url.join(href.trim()).ok()
    }

    /// Collects capture group 1 of every match of `pattern`, resolved against
    /// the page and de-duplicated in first-seen order.
    ///
    /// Matches without a first group, or whose capture does not resolve to a
    /// URL, are skipped.
    #[must_use]
    pub fn capture_links(&self, pattern: &Regex) -> Vec<Url> {
        let mut links: Vec<Url> = Vec::new();
        for captures in pattern.captures_iter(&self.html) {
            let Some(raw) = captures.get(1) else {
                continue;
            };
            match self.resolve(raw.as_str()) {
                Some(url) if !links.contains(&url) => links.push(url),
                Some(_) => {}
                None => debug!(link = raw.as_str(), "skipping unresolvable link"),
            }
        }
        links
    }
}

/// Strips path, query and fragment, keeping `scheme://authority/`.
fn document_base(url: &Url) -> Url {
    let mut base = url.clone();
    base.set_path("/");
    base.set_query(None);
    base.set_fragment(None);
    base
}
