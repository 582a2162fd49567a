//! Shared path generation for storage backends.
//!
//! Path format: `{YYYY-MM-DD}/{unix_seconds}-{micros}-{sanitized filename}`.

use chrono::{DateTime, Utc};

/// Generate a storage path for an uploaded file name.
///
/// All backends that control their own paths use this format for consistency.
/// The result never contains `..` or a leading `/`.
pub fn generate_path(base_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/{}-{}-{}",
        now.format("%Y-%m-%d"),
        now.timestamp(),
        now.timestamp_subsec_micros(),
        sanitize_filename(base_name)
    )
}

fn sanitize_filename(base_name: &str) -> String {
    let cleaned: String = base_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect();

    // dots alone could still spell a parent directory
    let cleaned = cleaned.replace("..", "-");
    let cleaned = cleaned.trim_matches(|c| c == '.' || c == '-');

    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned.to_string()
    }
}
