//! Headless Chromium fetcher using chromiumoxide.
//!
//! BBC section pages build their story cards client-side, so a plain GET
//! returns a shell without headlines. This fetcher drives a real browser:
//! navigate, wait for the listing marker, let secondary content settle, then
//! capture `document.documentElement.outerHTML`.
//!
//! One browser and one tab are created at launch and reused for every fetch.
//! The tab has a single navigation state, so fetches are serialized through a
//! mutex, and cookies are cleared after every fetch whatever its outcome.

use super::PageFetcher;
use crate::errors::FetchError;
use crate::models::RawPage;
use crate::scrapers::bbcnews::LISTING_MARKER;
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::ClearBrowserCookiesParams;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Launch and rendering settings for [`ChromiumFetcher`].
#[derive(Debug, Clone)]
pub struct ChromiumOptions {
    /// Browser executable; chromiumoxide searches the usual locations when unset.
    pub chrome_path: Option<PathBuf>,
    /// Upper bound for the initial navigation.
    pub page_load_timeout: Duration,
    /// Pause after the marker appears, for lazily painted content.
    pub settle_delay: Duration,
    /// CSS selector that signals the listing has rendered.
    pub marker: String,
    /// How often the marker is polled while waiting.
    pub poll_interval: Duration,
}

impl Default for ChromiumOptions {
    fn default() -> Self {
        Self {
            chrome_path: None,
            page_load_timeout: Duration::from_secs(30),
            settle_delay: Duration::from_secs(2),
            marker: LISTING_MARKER.to_string(),
            poll_interval: Duration::from_millis(250),
        }
    }
}

/// The browser-tab operations a fetch is made of.
#[async_trait]
trait BrowserTab: Send + Sync {
    async fn navigate(&self, url: &Url) -> Result<(), FetchError>;
    async fn has_element(&self, selector: &str) -> bool;
    async fn content(&self) -> Result<String, FetchError>;
    async fn clear_cookies(&self) -> Result<(), FetchError>;
}

#[async_trait]
impl BrowserTab for Page {
    async fn navigate(&self, url: &Url) -> Result<(), FetchError> {
        self.goto(url.as_str())
            .await
            .map(|_| ())
            .map_err(|e| FetchError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            })
    }

    async fn has_element(&self, selector: &str) -> bool {
        self.find_element(selector).await.is_ok()
    }

    async fn content(&self) -> Result<String, FetchError> {
        Ok(Page::content(self).await?)
    }

    async fn clear_cookies(&self) -> Result<(), FetchError> {
        self.execute(ClearBrowserCookiesParams::default()).await?;
        Ok(())
    }
}

/// A single tab behind a lock: one fetch at a time, cookies cleared after each.
struct TabSession<T> {
    tab: Mutex<Option<T>>,
    options: ChromiumOptions,
}

impl<T: BrowserTab> TabSession<T> {
    fn new(tab: T, options: ChromiumOptions) -> Self {
        Self {
            tab: Mutex::new(Some(tab)),
            options,
        }
    }

    async fn fetch(&self, url: &Url, wait: Duration) -> Result<RawPage, FetchError> {
        let guard = self.tab.lock().await;
        let tab = guard.as_ref().ok_or(FetchError::SessionClosed)?;

        let t0 = Instant::now();
        let result = self.render(tab, url, wait).await;

        if let Err(e) = tab.clear_cookies().await {
            warn!(error = %e, "Failed to clear browser cookies");
        }

        let elapsed_ms = t0.elapsed().as_millis() as u64;
        match &result {
            Ok(page) => info!(bytes = page.html.len(), elapsed_ms, "Rendered news page"),
            Err(e) => warn!(error = %e, elapsed_ms, "Rendering news page failed"),
        }
        result
    }

    async fn render(&self, tab: &T, url: &Url, wait: Duration) -> Result<RawPage, FetchError> {
        timeout(self.options.page_load_timeout, tab.navigate(url))
            .await
            .map_err(|_| FetchError::PageLoadTimeout {
                url: url.to_string(),
                after: self.options.page_load_timeout,
            })??;

        self.wait_for_marker(tab, wait).await?;
        sleep(self.options.settle_delay).await;

        let html = tab.content().await?;
        debug!(preview = %truncate_for_log(&html, 200), "Captured page content");
        Ok(RawPage::new(url.clone(), html))
    }

    async fn wait_for_marker(&self, tab: &T, wait: Duration) -> Result<(), FetchError> {
        let deadline = Instant::now() + wait;
        loop {
            if tab.has_element(&self.options.marker).await {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(FetchError::MarkerTimeout {
                    selector: self.options.marker.clone(),
                    after: wait,
                });
            }
            sleep(self.options.poll_interval).await;
        }
    }

    /// Detach the tab once any in-flight fetch has finished.
    async fn close(&self) -> Option<T> {
        self.tab.lock().await.take()
    }
}

/// Process-lifetime browser session behind the [`PageFetcher`] interface.
///
/// Call [`PageFetcher::shutdown`] before dropping it so the browser process
/// exits cleanly.
pub struct ChromiumFetcher {
    session: TabSession<Page>,
    process: Mutex<Option<(Browser, JoinHandle<()>)>>,
}

impl ChromiumFetcher {
    /// Launch a headless Chromium instance and open the tab used for fetching.
    #[instrument(level = "info", skip_all, fields(chrome_path = ?options.chrome_path))]
    pub async fn launch(options: ChromiumOptions) -> Result<Self, FetchError> {
        let mut builder = BrowserConfig::builder()
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .request_timeout(options.page_load_timeout);
        if let Some(path) = &options.chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(FetchError::Browser)?;

        let (browser, mut handler) = Browser::launch(config).await?;

        // The CDP connection only makes progress while its handler is polled.
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!(error = %e, "CDP handler event error");
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                handler.abort();
                return Err(e.into());
            }
        };

        info!("Chromium session started");
        Ok(Self {
            session: TabSession::new(page, options),
            process: Mutex::new(Some((browser, handler))),
        })
    }
}

#[async_trait]
impl PageFetcher for ChromiumFetcher {
    #[instrument(level = "info", skip_all, fields(%url))]
    async fn fetch(&self, url: &Url, wait: Duration) -> Result<RawPage, FetchError> {
        self.session.fetch(url, wait).await
    }

    async fn shutdown(&self) -> Result<(), FetchError> {
        if let Some(page) = self.session.close().await {
            if let Err(e) = page.close().await {
                debug!(error = %e, "Failed to close tab");
            }
        }
        let Some((mut browser, handler)) = self.process.lock().await.take() else {
            return Ok(());
        };

        let closed = browser.close().await.map(|_| ());
        if let Err(e) = browser.wait().await {
            warn!(error = %e, "Failed waiting for Chromium to exit");
        }
        handler.abort();

        info!("Chromium session closed");
        closed.map_err(FetchError::from)
    }
}
