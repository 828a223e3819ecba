//! Static HTTP fetcher.
//!
//! A drop-in alternative to [`ChromiumFetcher`](super::chromium::ChromiumFetcher)
//! for sources that serve their listing as plain markup. There is nothing to
//! wait for: the marker is checked once on the downloaded body.

use super::PageFetcher;
use crate::errors::FetchError;
use crate::models::RawPage;
use crate::scrapers::bbcnews::{LISTING_MARKER, has_listing};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{info, instrument};
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url, _wait: Duration) -> Result<RawPage, FetchError> {
        let t0 = Instant::now();
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await?;
        if !has_listing(&html) {
            return Err(FetchError::MarkerMissing {
                selector: LISTING_MARKER.to_string(),
                url: url.to_string(),
            });
        }

        info!(
            bytes = html.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Downloaded news page"
        );
        Ok(RawPage::new(url.clone(), html))
    }
}
