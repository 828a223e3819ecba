//! BBC News section page extractor.
//!
//! Section pages such as `https://www.bbc.com/news/technology` render each
//! story as a card:
//!
//! ```text
//! <a href="/news/articles/c0abc">
//!   <div data-testid="card-text-wrapper">
//!     <h2>Headline</h2>
//!     ...
//!     <span data-testid="card-metadata-tag">2 hrs ago</span>
//!   </div>
//! </a>
//! ```
//!
//! The headline comes from the first `h2` in the card, the link from the
//! nearest enclosing anchor and the relative time from the first metadata tag
//! that follows the card start in document order.

use crate::models::{NOW_LABEL, NewsItem, RawPage};
use crate::utils::collapse_whitespace;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::{debug, info, instrument};
use url::Url;

/// Element whose presence means the listing has rendered.
pub const LISTING_MARKER: &str = "[data-testid='card-text-wrapper']";

static CARD_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div[data-testid='card-text-wrapper']").unwrap());
static TITLE_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static TIME_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("span[data-testid='card-metadata-tag']").unwrap());
static MARKER_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse(LISTING_MARKER).unwrap());

/// Check whether `html` contains at least one story card.
pub fn has_listing(html: &str) -> bool {
    Html::parse_document(html)
        .select(&MARKER_SELECTOR)
        .next()
        .is_some()
}

/// Extract up to `limit` news items from a rendered section page.
///
/// The first `limit` cards are taken before validation, so a page whose
/// leading cards are malformed yields fewer than `limit` items even if valid
/// cards follow. Cards without a headline or link are skipped.
///
/// # Arguments
///
/// * `page` - Rendered page; its URL is the base for relative links
/// * `limit` - Maximum number of cards to consider
///
/// # Returns
///
/// Items in page order (most recent first, as the site renders them).
#[instrument(level = "info", skip_all, fields(url = %page.url, limit = limit))]
pub fn extract_news(page: &RawPage, limit: usize) -> Vec<NewsItem> {
    if limit == 0 || page.is_empty() {
        return Vec::new();
    }

    let document = Html::parse_document(&page.html);

    // Pre-order traversal is document order.
    let position: HashMap<_, usize> = document
        .tree
        .root()
        .descendants()
        .enumerate()
        .map(|(i, node)| (node.id(), i))
        .collect();

    let time_tags: Vec<(usize, ElementRef)> = document
        .select(&TIME_SELECTOR)
        .filter_map(|el| position.get(&el.id()).map(|&p| (p, el)))
        .collect();

    let mut items = Vec::new();
    let mut skipped = 0usize;
    for (index, card) in document.select(&CARD_SELECTOR).take(limit).enumerate() {
        match parse_card(card, &page.url) {
            Some((title, link)) => {
                let published_label = position
                    .get(&card.id())
                    .and_then(|&start| following_tag(&time_tags, start))
                    .unwrap_or_else(|| NOW_LABEL.to_string());
                items.push(NewsItem {
                    title,
                    link,
                    published_label,
                });
            }
            None => {
                skipped += 1;
                debug!(index, "Skipping card without headline or link");
            }
        }
    }

    info!(count = items.len(), skipped, "Extracted BBC news items");
    items
}

/// Headline and absolute link of a card, if both are present.
fn parse_card(card: ElementRef, base: &Url) -> Option<(String, String)> {
    let title = card
        .select(&TITLE_SELECTOR)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())?;

    let anchor = card
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "a")?;
    let href = anchor.value().attr("href")?.trim();
    if href.is_empty() {
        return None;
    }

    let link = base.join(href).ok()?;
    if !matches!(link.scheme(), "http" | "https") {
        return None;
    }

    Some((title, link.to_string()))
}

/// Text of the first time tag strictly after `start` in document order.
fn following_tag(time_tags: &[(usize, ElementRef)], start: usize) -> Option<String> {
    let next = time_tags.partition_point(|(p, _)| *p <= start);
    time_tags
        .get(next)
        .map(|(_, el)| element_text(*el))
        .filter(|t| !t.is_empty())
}

fn element_text(el: ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}
