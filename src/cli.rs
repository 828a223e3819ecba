//! Command-line interface definitions for the news relay.
//!
//! Every option can also come from the environment (or a `.env` file, which
//! is loaded before parsing).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// How listing pages are obtained.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RendererKind {
    /// Headless Chromium; needed for pages that render client-side.
    Chromium,
    /// Plain HTTP GET.
    Http,
}

/// Command-line arguments for the news relay.
///
/// # Examples
///
/// ```sh
/// # Start the bot (token from the environment)
/// TELEGRAM_BOT_TOKEN=123:abc news_relay run
///
/// # Print the current technology headlines as JSON
/// news_relay scrape technology
///
/// # Use plain HTTP and keep the JSON on disk
/// news_relay --renderer http scrape world -j ./json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Page renderer
    #[arg(long, global = true, env = "NEWS_RELAY_RENDERER", value_enum, default_value_t = RendererKind::Chromium)]
    pub renderer: RendererKind,

    /// Path to the Chrome/Chromium executable
    #[arg(long, global = true, env = "CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Seconds allowed for the initial page load
    #[arg(long, global = true, default_value_t = 30)]
    pub page_load_timeout_secs: u64,

    /// Seconds to wait for the news listing to render
    #[arg(long, global = true, default_value_t = 10)]
    pub wait_timeout_secs: u64,

    /// Milliseconds to let the page settle after the listing appears
    #[arg(long, global = true, default_value_t = 2000)]
    pub settle_ms: u64,

    /// Maximum number of news items per category
    #[arg(long, global = true, default_value_t = 5)]
    pub limit: usize,

    /// Report fetch failures as "news not found" instead of "no news found"
    #[arg(long, global = true)]
    pub surface_fetch_errors: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the Telegram bot
    Run {
        /// Telegram bot access token
        #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
        token: String,

        /// Milliseconds to pause after each delivered news item
        #[arg(long, default_value_t = 1000)]
        item_delay_ms: u64,
    },
    /// Fetch one category once and print its items as JSON
    Scrape {
        /// Category key (world, politics, technology, business, science, health)
        category: String,

        /// Write the JSON under this directory instead of printing it
        #[arg(short, long)]
        json_output_dir: Option<String>,
    },
}
