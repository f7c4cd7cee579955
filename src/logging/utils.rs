//! Utility functions for time formatting and console truncation.

/// Format the current local time as `YYYY-MM-DDTHH:MM:SS.ffffff` (ISO 8601,
/// microsecond precision).
///
/// Used both for log-file lines and for the timestamps stored in the status
/// ledger, so the two can be correlated.
#[must_use]
pub fn iso_timestamp() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Truncate `s` to at most `max` characters (not bytes).
#[must_use]
pub fn truncate_chars(s: &str, max: usize) -> &str {
    s.char_indices()
        .nth(max)
        .and_then(|(idx, _)| s.get(..idx))
        .unwrap_or(s)
}
