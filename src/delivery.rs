//! Delivery orchestrator: fetch, extract and relay one category.
//!
//! Each invocation walks `Idle -> Fetching -> {Delivering | Empty | Failed}`
//! and ends back at `Idle` with no state kept:
//!
//! | Outcome | Outbound effects |
//! |---------|------------------|
//! | Failed | edit: loading, edit: news not found |
//! | Empty | edit: loading, edit: no news found |
//! | Delivered(n) | edit: loading, edit: header, n × send: item, send: menu |
//!
//! Items go out one at a time in extraction order with a fixed pause after
//! each, which keeps a burst of headlines under Telegram's per-chat limits.
//! Once started an invocation always runs to one of these outcomes.

use crate::categories::CategoryRegistry;
use crate::errors::{FetchError, SendError};
use crate::fetchers::PageFetcher;
use crate::models::{Category, NewsItem};
use crate::outputs::messages;
use crate::outputs::{ChatSink, OutboundMessage};
use crate::scrapers::bbcnews::extract_news;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};
use url::Url;

/// How a delivery ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The page could not be obtained.
    Failed,
    /// The page was obtained but held no usable items.
    Empty,
    /// This many item messages were sent.
    Delivered(usize),
}

/// Tunables for [`Delivery`].
#[derive(Debug, Clone)]
pub struct DeliverySettings {
    /// Maximum number of items per delivery.
    pub limit: usize,
    /// How long the fetcher may wait for the listing to render.
    pub wait_timeout: Duration,
    /// Pause after each item message.
    pub item_delay: Duration,
}

impl Default for DeliverySettings {
    fn default() -> Self {
        Self {
            limit: 5,
            wait_timeout: Duration::from_secs(10),
            item_delay: Duration::from_secs(1),
        }
    }
}

/// Drives a [`PageFetcher`] and the extractor for one category selection.
#[derive(Clone)]
pub struct Delivery {
    fetcher: Arc<dyn PageFetcher>,
    registry: Arc<CategoryRegistry>,
    settings: DeliverySettings,
}

impl Delivery {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        registry: Arc<CategoryRegistry>,
        settings: DeliverySettings,
    ) -> Self {
        Self {
            fetcher,
            registry,
            settings,
        }
    }

    /// Fetch and extract the current items for `category` without sending anything.
    ///
    /// `Ok(vec![])` means the page had no usable items.
    pub async fn collect(&self, category: &Category) -> Result<Vec<NewsItem>, FetchError> {
        let url = Url::parse(&category.source_url).map_err(|source| FetchError::InvalidUrl {
            url: category.source_url.clone(),
            source,
        })?;
        let page = self.fetcher.fetch(&url, self.settings.wait_timeout).await?;
        Ok(extract_news(&page, self.settings.limit))
    }

    /// Run one delivery for `category`, reporting progress through `sink`.
    ///
    /// # Errors
    ///
    /// Only transport failures are errors; fetch problems end in
    /// [`DeliveryOutcome::Failed`] or [`DeliveryOutcome::Empty`].
    #[instrument(level = "info", skip_all, fields(category = %category.key))]
    pub async fn deliver(
        &self,
        category: &Category,
        sink: &dyn ChatSink,
    ) -> Result<DeliveryOutcome, SendError> {
        sink.edit(OutboundMessage::text(messages::loading(&category.label)))
            .await?;

        let items = match self.collect(category).await {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "Fetching news failed");
                sink.edit(OutboundMessage::text(messages::news_not_found()))
                    .await?;
                return Ok(DeliveryOutcome::Failed);
            }
        };

        if items.is_empty() {
            info!("No news items found");
            sink.edit(OutboundMessage::text(messages::no_news())).await?;
            return Ok(DeliveryOutcome::Empty);
        }

        sink.edit(OutboundMessage::text(messages::header(&category.label)))
            .await?;

        for item in &items {
            sink.send(OutboundMessage::text(messages::news_item(item)))
                .await?;
            sleep(self.settings.item_delay).await;
        }

        sink.send(OutboundMessage::with_keyboard(
            messages::next_action(),
            messages::main_menu(&self.registry),
        ))
        .await?;

        info!(count = items.len(), "Delivered news items");
        Ok(DeliveryOutcome::Delivered(items.len()))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::fetchers::CollapseErrors;
    use crate::models::RawPage;
    use crate::outputs::testing::{Kind, RecordingSink};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Serves fixed markup, or a marker timeout when `html` is `None`.
    pub(crate) struct FakeFetcher {
        pub html: Option<String>,
        pub calls: AtomicUsize,
    }

    impl FakeFetcher {
        pub fn serving(html: impl Into<String>) -> Self {
            Self {
                html: Some(html.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn timing_out() -> Self {
            Self {
                html: None,
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &Url, wait: Duration) -> Result<RawPage, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.html {
                Some(html) => Ok(RawPage::new(url.clone(), html.clone())),
                None => Err(FetchError::MarkerTimeout {
                    selector: "[data-testid='card-text-wrapper']".to_string(),
                    after: wait,
                }),
            }
        }
    }

    pub(crate) fn listing(titles: &[&str]) -> String {
        titles
            .iter()
            .enumerate()
            .map(|(i, t)| {
                format!(
                    r#"<a href="/news/articles/{i}"><div data-testid="card-text-wrapper"><h2>{t}</h2>
                       <span data-testid="card-metadata-tag">{i} hrs ago</span></div></a>"#
                )
            })
            .collect()
    }

    fn delivery(fetcher: Arc<dyn PageFetcher>) -> Delivery {
        Delivery::new(
            fetcher,
            Arc::new(CategoryRegistry::bbc().unwrap()),
            DeliverySettings::default(),
        )
    }

    fn technology() -> Category {
        CategoryRegistry::bbc().unwrap().resolve("technology").unwrap().clone()
    }

    #[tokio::test(start_paused = true)]
    async fn test_delivers_in_order_with_spacing() {
        let fetcher = Arc::new(FakeFetcher::serving(listing(&["A", "B"])));
        let sink = RecordingSink::default();

        let outcome = delivery(fetcher).deliver(&technology(), &sink).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Delivered(2));

        let events = sink.events();
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(kinds, [Kind::Edit, Kind::Edit, Kind::Send, Kind::Send, Kind::Send]);

        assert_eq!(events[0].message.text, messages::loading("💻 Technology"));
        assert_eq!(events[1].message.text, messages::header("💻 Technology"));
        assert!(events[2].message.text.starts_with("<b>A</b>"));
        assert!(events[3].message.text.starts_with("<b>B</b>"));
        assert_eq!(events[4].message.text, messages::next_action());
        assert!(events[4].message.keyboard.is_some());
        assert!(events[..4].iter().all(|e| e.message.keyboard.is_none()));

        assert!(events[3].at - events[2].at >= Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_respects_limit() {
        let titles = ["1", "2", "3", "4", "5", "6", "7"];
        let fetcher = Arc::new(FakeFetcher::serving(listing(&titles)));
        let sink = RecordingSink::default();

        let outcome = delivery(fetcher).deliver(&technology(), &sink).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Delivered(5));

        let items: Vec<_> = sink
            .events()
            .into_iter()
            .filter(|e| e.kind == Kind::Send && e.message.keyboard.is_none())
            .collect();
        assert_eq!(items.len(), 5);
        for (i, item) in items.iter().enumerate() {
            assert!(item.message.text.starts_with(&format!("<b>{}</b>", i + 1)));
            assert!(item.message.text.contains("https://www.bbc.com/news/articles/"));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_page() {
        let fetcher = Arc::new(FakeFetcher::serving("<html><body>nothing</body></html>"));
        let sink = RecordingSink::default();

        let outcome = delivery(fetcher).deliver(&technology(), &sink).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Empty);
        assert_eq!(
            sink.texts(),
            [messages::loading("💻 Technology"), messages::no_news()]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_error_fails() {
        let fetcher = Arc::new(FakeFetcher::timing_out());
        let sink = RecordingSink::default();

        let outcome = delivery(fetcher).deliver(&technology(), &sink).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Failed);
        assert_eq!(sink.texts().last().unwrap(), &messages::news_not_found());
        assert_eq!(sink.events().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_timeout_collapses_to_empty() {
        let fetcher = Arc::new(CollapseErrors::new(FakeFetcher::timing_out()));
        let sink = RecordingSink::default();

        let outcome = delivery(fetcher).deliver(&technology(), &sink).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Empty);
        assert_eq!(sink.texts().last().unwrap(), &messages::no_news());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unparseable_url_fails_without_fetch() {
        let fetcher = Arc::new(FakeFetcher::serving(listing(&["A"])));
        let sink = RecordingSink::default();
        let broken = Category::new("broken", "Broken", "::not a url::");

        let outcome = delivery(fetcher.clone()).deliver(&broken, &sink).await.unwrap();
        assert_eq!(outcome, DeliveryOutcome::Failed);
        assert_eq!(fetcher.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_collect_does_not_send() {
        let fetcher = Arc::new(FakeFetcher::serving(listing(&["A", "B", "C"])));
        let items = delivery(fetcher).collect(&technology()).await.unwrap();

        let titles: Vec<_> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, ["A", "B", "C"]);
        assert_eq!(items[1].published_label, "1 hrs ago");
    }
}
