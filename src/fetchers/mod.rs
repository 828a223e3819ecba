//! Page fetchers: obtain the rendered markup of a listing page.
//!
//! # Architecture
//!
//! - [`PageFetcher`]: capability trait the orchestrator calls through
//! - [`chromium::ChromiumFetcher`]: headless Chromium, for pages that render
//!   their listing with JavaScript
//! - [`http::HttpFetcher`]: plain GET, for sources that serve static markup
//! - [`CollapseErrors`]: decorator that turns any fetch failure into an empty
//!   page, so an unreachable source reads the same as one with no news
//!
//! Extraction never depends on which fetcher produced the page.

pub mod chromium;
pub mod http;

use crate::errors::FetchError;
use crate::models::RawPage;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::{error, instrument};
use url::Url;

/// Something that can load a listing page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Load `url` and return its rendered content.
    ///
    /// `wait` bounds how long the fetcher may wait for the listing marker to
    /// appear once the page has loaded.
    async fn fetch(&self, url: &Url, wait: Duration) -> Result<RawPage, FetchError>;

    /// Release long-lived resources. Fetches after shutdown fail.
    async fn shutdown(&self) -> Result<(), FetchError> {
        Ok(())
    }
}

/// Decorator that logs fetch failures and returns an empty page instead.
///
/// With this in place the orchestrator reports "no news found" both when the
/// source is down and when it genuinely lists nothing.
pub struct CollapseErrors<F> {
    inner: F,
}

impl<F> CollapseErrors<F>
where
    F: PageFetcher,
{
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F> fmt::Debug for CollapseErrors<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollapseErrors").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> PageFetcher for CollapseErrors<F>
where
    F: PageFetcher,
{
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url, wait: Duration) -> Result<RawPage, FetchError> {
        match self.inner.fetch(url, wait).await {
            Ok(page) => Ok(page),
            Err(e) => {
                error!(error = %e, "Failed to load news page; treating as empty");
                Ok(RawPage::empty(url.clone()))
            }
        }
    }

    async fn shutdown(&self) -> Result<(), FetchError> {
        self.inner.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct Failing {
        shut_down: AtomicBool,
    }

    #[async_trait]
    impl PageFetcher for Failing {
        async fn fetch(&self, _url: &Url, wait: Duration) -> Result<RawPage, FetchError> {
            Err(FetchError::MarkerTimeout {
                selector: "x".to_string(),
                after: wait,
            })
        }

        async fn shutdown(&self) -> Result<(), FetchError> {
            self.shut_down.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Static;

    #[async_trait]
    impl PageFetcher for Static {
        async fn fetch(&self, url: &Url, _wait: Duration) -> Result<RawPage, FetchError> {
            Ok(RawPage::new(url.clone(), "<p>hi</p>".to_string()))
        }
    }

    #[tokio::test]
    async fn test_collapse_turns_error_into_empty_page() {
        let fetcher = CollapseErrors::new(Failing {
            shut_down: AtomicBool::new(false),
        });
        let url = Url::parse("https://www.bbc.com/news/world").unwrap();

        let page = fetcher.fetch(&url, Duration::from_secs(1)).await.unwrap();
        assert!(page.is_empty());
        assert_eq!(page.url, url);
    }

    #[tokio::test]
    async fn test_collapse_passes_success_through() {
        let fetcher = CollapseErrors::new(Static);
        let url = Url::parse("https://www.bbc.com/news/world").unwrap();

        let page = fetcher.fetch(&url, Duration::from_secs(1)).await.unwrap();
        assert_eq!(page.html, "<p>hi</p>");
    }

    #[tokio::test]
    async fn test_collapse_forwards_shutdown() {
        let fetcher = CollapseErrors::new(Failing {
            shut_down: AtomicBool::new(false),
        });
        fetcher.shutdown().await.unwrap();
        assert!(fetcher.inner.shut_down.load(Ordering::SeqCst));
    }
}
