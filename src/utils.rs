//! Small helpers for text cleanup, log previews and output directories.

use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument, warn};

/// Collapse every run of whitespace into a single space and trim the ends.
///
/// Markup text nodes carry indentation and line breaks from the page source;
/// headlines are sent as one line.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(collapse_whitespace("  Budget\n  vote "), "Budget vote");
/// ```
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are cut to at most `max` bytes on a character boundary with
/// an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if needed, then writes and removes a marker file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the marker file
/// cannot be written.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    let marker = Path::new(path).join(".news_relay_write_check");
    fs::write(&marker, b"").await?;
    if let Err(e) = fs::remove_file(&marker).await {
        warn!(marker = %marker.display(), error = %e, "Failed to remove write check file");
    }
    info!("Output directory is writable");
    Ok(())
}
