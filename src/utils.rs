//! Utility functions for text measurement, log formatting, time classification,
//! and file system checks.
//!
//! - Word counting and character-safe prefixes shared by the extractor and synthesizers
//! - String truncation for logging long model responses
//! - JSON error detection for truncated model output
//! - Time classification for digest edition naming
//! - File system validation for output directories

use chrono::{NaiveTime, Timelike};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};

/// Count whitespace-separated words.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Return at most `max` characters from the start of `text`.
///
/// Cuts on a character boundary, so multi-byte text never panics.
pub fn char_prefix(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let head = char_prefix(s, max);
    if head.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", head, s.len() - head.len())
    }
}

/// Detect if a serde_json error indicates truncated/incomplete JSON.
///
/// When the model response is cut off by its token limit, the resulting
/// JSON fails to parse with an EOF error.
pub fn looks_truncated(e: &serde_json::Error) -> bool {
    use serde_json::error::Category;
    matches!(e.classify(), Category::Eof)
}

/// Classify a wall-clock time into morning, afternoon, or evening.
///
/// - **Morning**: 00:00 - 08:00
/// - **Afternoon**: 08:00 - 16:00
/// - **Evening**: 16:00 - 24:00
pub fn time_of_day(tod: NaiveTime) -> &'static str {
    match tod.hour() {
        0..=7 => "morning",
        8..=15 => "afternoon",
        _ => "evening",
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    fs::create_dir_all(path).await?;
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
