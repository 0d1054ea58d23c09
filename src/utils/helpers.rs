//! Helper functions and utilities
//!
//! This module contains common helper functions used throughout the application.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Duration, Utc};

use crate::utils::errors::{Result, VinsmokeError};

/// Prefix marking client-only records that have not been saved yet
pub const TEMP_ID_PREFIX: &str = "temp_";

static LAST_TEMP_MS: AtomicI64 = AtomicI64::new(0);

/// Generate a temporary id for a client-only record (`temp_<epoch-ms>`).
/// The millisecond component is bumped when two ids land in the same tick.
pub fn generate_temp_id() -> String {
    let now = Utc::now().timestamp_millis();
    let unique = LAST_TEMP_MS
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(if now > last { now } else { last + 1 })
        })
        .map(|last| if now > last { now } else { last + 1 })
        .unwrap_or(now);
    format!("{}{}", TEMP_ID_PREFIX, unique)
}

/// Check whether an id was minted client-side
pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

/// Validate an international phone number before any pairing request is
/// issued: leading `+` and at least 10 digits once formatting is stripped
pub fn validate_phone_number(phone: &str) -> Result<()> {
    if phone.is_empty() {
        return Err(VinsmokeError::InvalidInput(
            "Please enter a phone number".to_string(),
        ));
    }

    if !phone.starts_with('+') {
        return Err(VinsmokeError::InvalidInput(
            "Phone number must start with + followed by country code (e.g., +1234567890)"
                .to_string(),
        ));
    }

    let digit_count = phone.chars().filter(|c| c.is_ascii_digit()).count();
    if digit_count < 10 {
        return Err(VinsmokeError::InvalidInput(
            "Please enter a valid phone number with country code".to_string(),
        ));
    }

    Ok(())
}

/// Strip characters that could smuggle markup through user-entered text
pub fn sanitize_input(input: &str) -> String {
    let stripped: String = input.chars().filter(|c| *c != '<' && *c != '>').collect();
    stripped
        .replace("javascript:", "")
        .replace("Javascript:", "")
        .trim()
        .to_string()
}

/// Format a timestamp for display
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Format a timestamp for user display (relative time)
pub fn format_relative_time(timestamp: DateTime<Utc>) -> String {
    let now = Utc::now();
    let diff = now.signed_duration_since(timestamp);

    if diff < Duration::minutes(1) {
        "just now".to_string()
    } else if diff < Duration::hours(1) {
        format!("{} minutes ago", diff.num_minutes())
    } else if diff < Duration::days(1) {
        format!("{} hours ago", diff.num_hours())
    } else if diff < Duration::weeks(1) {
        format!("{} days ago", diff.num_days())
    } else {
        format_timestamp(timestamp)
    }
}

/// Truncate text to a maximum length with ellipsis
pub fn truncate_text(text: &str, max_length: usize) -> String {
    if text.chars().count() <= max_length {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_length.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

/// Sanitize filename for safe storage
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_validation_accepts_international_format() {
        assert!(validate_phone_number("+1234567890").is_ok());
        assert!(validate_phone_number("+49 151 2345 6789").is_ok());
    }

    #[test]
    fn test_phone_validation_rejects_missing_plus() {
        assert!(validate_phone_number("1234567890").is_err());
    }

    #[test]
    fn test_phone_validation_rejects_short_numbers() {
        assert!(validate_phone_number("+123").is_err());
        assert!(validate_phone_number("").is_err());
    }

    #[test]
    fn test_temp_ids_are_unique_and_prefixed() {
        let a = generate_temp_id();
        let b = generate_temp_id();
        assert!(is_temp_id(&a));
        assert!(is_temp_id(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_sanitize_input_strips_markup() {
        assert_eq!(sanitize_input("  <b>hi</b>  "), "bhi/b");
        assert_eq!(sanitize_input("javascript:alert(1)"), "alert(1)");
    }

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("short", 10), "short");
        assert_eq!(truncate_text("a very long sentence", 10), "a very ...");
    }
}
