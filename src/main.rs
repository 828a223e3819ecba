//! # News Relay
//!
//! A Telegram bot that relays the latest BBC News headlines. The user picks a
//! category from an inline menu; the bot renders the matching BBC section page,
//! extracts the newest stories and posts them one by one, followed by the menu
//! again.
//!
//! ## Usage
//!
//! ```sh
//! TELEGRAM_BOT_TOKEN=123:abc news_relay run
//! news_relay scrape technology -j ./json
//! ```
//!
//! ## Architecture
//!
//! 1. **Routing**: callback payloads become [`router::Action`]s
//! 2. **Fetching**: a [`fetchers::PageFetcher`] renders the section page
//!    (headless Chromium by default)
//! 3. **Extraction**: [`scrapers::bbcnews`] turns markup into news items
//! 4. **Delivery**: [`delivery::Delivery`] posts the items in order, throttled

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use teloxide::Bot;
use teloxide::requests::Requester;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod categories;
mod cli;
mod delivery;
mod errors;
mod fetchers;
mod models;
mod outputs;
mod router;
mod scrapers;
mod telegram;
mod utils;

use categories::CategoryRegistry;
use cli::{Cli, Command, RendererKind};
use delivery::{Delivery, DeliverySettings};
use fetchers::chromium::{ChromiumFetcher, ChromiumOptions};
use fetchers::http::HttpFetcher;
use fetchers::{CollapseErrors, PageFetcher};
use outputs::json::{ScrapeReport, write_report};
use router::Router;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // .env may carry RUST_LOG as well as the bot token.
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_relay starting up");
    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env loaded"),
    }

    let args = Cli::parse();
    debug!(renderer = ?args.renderer, limit = args.limit, "Parsed CLI arguments");

    let registry = Arc::new(CategoryRegistry::bbc()?);
    debug!(categories = registry.len(), "Category registry loaded");
    let fetcher = build_fetcher(&args).await?;

    let item_delay = match &args.command {
        Command::Run { item_delay_ms, .. } => Duration::from_millis(*item_delay_ms),
        Command::Scrape { .. } => Duration::ZERO,
    };
    let settings = DeliverySettings {
        limit: args.limit,
        wait_timeout: Duration::from_secs(args.wait_timeout_secs),
        item_delay,
    };
    let delivery = Delivery::new(fetcher.clone(), registry.clone(), settings);

    let result = match args.command {
        Command::Run { token, .. } => run_bot(token, Router::new(registry, delivery)).await,
        Command::Scrape {
            category,
            json_output_dir,
        } => scrape(&registry, &delivery, &category, json_output_dir.as_deref()).await,
    };

    // The browser must go down whether or not the command succeeded.
    if let Err(e) = fetcher.shutdown().await {
        warn!(error = %e, "Fetcher shutdown failed");
    }

    let elapsed = start_time.elapsed();
    info!(?elapsed, secs = elapsed.as_secs(), "Execution complete");
    result
}

/// Build the configured fetcher, wrapped in [`CollapseErrors`] unless fetch
/// errors should reach the user.
async fn build_fetcher(args: &Cli) -> Result<Arc<dyn PageFetcher>, Box<dyn Error>> {
    let page_load_timeout = Duration::from_secs(args.page_load_timeout_secs);
    let fetcher = match args.renderer {
        RendererKind::Chromium => {
            let options = ChromiumOptions {
                chrome_path: args.chrome_path.clone(),
                page_load_timeout,
                settle_delay: Duration::from_millis(args.settle_ms),
                ..ChromiumOptions::default()
            };
            wrap(ChromiumFetcher::launch(options).await?, args.surface_fetch_errors)
        }
        RendererKind::Http => wrap(HttpFetcher::new(page_load_timeout)?, args.surface_fetch_errors),
    };
    info!(renderer = ?args.renderer, surface_fetch_errors = args.surface_fetch_errors, "Fetcher ready");
    Ok(fetcher)
}

fn wrap<F>(fetcher: F, surface_errors: bool) -> Arc<dyn PageFetcher>
where
    F: PageFetcher + 'static,
{
    if surface_errors {
        Arc::new(fetcher)
    } else {
        Arc::new(CollapseErrors::new(fetcher))
    }
}

async fn run_bot(token: String, router: Router) -> Result<(), Box<dyn Error>> {
    let bot = Bot::new(token);
    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), "Bot started"),
        Err(e) => {
            error!(error = %e, "Failed to start bot");
            return Err(e.into());
        }
    }

    telegram::run(bot, Arc::new(router)).await;
    Ok(())
}

#[instrument(level = "info", skip(registry, delivery))]
async fn scrape(
    registry: &CategoryRegistry,
    delivery: &Delivery,
    key: &str,
    json_output_dir: Option<&str>,
) -> Result<(), Box<dyn Error>> {
    let category = registry.resolve(key)?;
    let items = delivery.collect(category).await?;
    if items.is_empty() {
        warn!("No news items found");
    }

    let report = ScrapeReport::new(category, items, chrono::Local::now());
    match json_output_dir {
        Some(dir) => {
            let path = write_report(&report, dir).await?;
            info!(%path, "Scrape written");
        }
        None => println!("{}", report.to_json()?),
    }
    Ok(())
}
