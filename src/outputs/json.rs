//! JSON output for the `scrape` subcommand.
//!
//! # Output Structure
//!
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     ├── technology.json
//!     └── world.json
//! ```
//!
//! A later scrape of the same category on the same day overwrites the file.

use crate::models::{Category, NewsItem};
use crate::utils::ensure_writable_dir;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

/// One scrape of one category.
#[derive(Debug, Serialize)]
pub struct ScrapeReport {
    pub category: String,
    pub label: String,
    pub source_url: String,
    /// RFC 3339 local timestamp.
    pub fetched_at: String,
    pub items: Vec<NewsItem>,
    #[serde(skip)]
    local_date: String,
}

impl ScrapeReport {
    pub fn new(category: &Category, items: Vec<NewsItem>, fetched_at: DateTime<Local>) -> Self {
        Self {
            category: category.key.clone(),
            label: category.label.clone(),
            source_url: category.source_url.clone(),
            fetched_at: fetched_at.to_rfc3339(),
            items,
            local_date: fetched_at.date_naive().to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Write a [`ScrapeReport`] under a date directory.
///
/// # Returns
///
/// The path of the written file: `{json_output_dir}/{date}/{category}.json`.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir, category = %report.category))]
pub async fn write_report(
    report: &ScrapeReport,
    json_output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    let json = report.to_json()?;

    let full_json_dir = format!(
        "{}/{}",
        json_output_dir.trim_end_matches('/'),
        report.local_date
    );
    ensure_writable_dir(&full_json_dir).await?;

    let output_json_filename = format!("{}/{}.json", full_json_dir, report.category);
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename, items = report.items.len(), "Wrote scrape report");

    Ok(output_json_filename)
}
