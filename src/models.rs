//! Data models shared by the fetch, extract and delivery stages.
//!
//! - [`Category`]: one topical feed from the registry
//! - [`NewsItem`]: a single headline extracted from a listing page
//! - [`RawPage`]: rendered markup as returned by a fetcher
//!
//! None of these are persisted. Items are built per fetch and dropped once
//! they have been delivered.

use serde::Serialize;
use url::Url;

/// Label used when a card carries no relative-time tag.
pub const NOW_LABEL: &str = "Just now";

/// A topical news feed.
///
/// Categories are defined once at startup (see
/// [`CategoryRegistry`](crate::categories::CategoryRegistry)) and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    /// Unique key, used in callback payloads (`category_<key>`).
    pub key: String,
    /// Human-readable label shown on menu buttons and in headers.
    pub label: String,
    /// Absolute URL of the listing page for this category.
    pub source_url: String,
}

impl Category {
    pub fn new(key: &str, label: &str, source_url: &str) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            source_url: source_url.to_string(),
        }
    }
}

/// A headline entry extracted from a listing page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewsItem {
    /// Headline text, never empty.
    pub title: String,
    /// Absolute link to the story.
    pub link: String,
    /// Relative publish time as rendered by the source ("2 hrs ago"),
    /// or [`NOW_LABEL`].
    pub published_label: String,
}

/// Fully rendered page content.
#[derive(Debug, Clone)]
pub struct RawPage {
    /// The URL the page was loaded from. Relative links resolve against it.
    pub url: Url,
    /// Page markup.
    pub html: String,
}

impl RawPage {
    pub fn new(url: Url, html: String) -> Self {
        Self { url, html }
    }

    /// A page with no content, the degraded result of a failed fetch.
    pub fn empty(url: Url) -> Self {
        Self {
            url,
            html: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.html.trim().is_empty()
    }
}
