//! E.164 phone number validation

use once_cell::sync::Lazy;
use regex::Regex;

/// `+`, a non-zero country code digit, then 7 to 14 more digits.
static E164: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\+[1-9]\d{7,14}$").unwrap_or_else(|e| panic!("invalid E.164 pattern: {e}"))
});

/// Validate and normalize a phone number to E.164.
///
/// Spaces, dashes, dots and parentheses are stripped first, so
/// `"+1 (555) 123-4567"` normalizes to `"+15551234567"`.
pub fn validate_phone_number(input: &str) -> Result<String, String> {
    let normalized: String = input
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '.' | '(' | ')'))
        .collect();

    if normalized.is_empty() {
        return Err("Phone number is empty".to_string());
    }
    if !E164.is_match(&normalized) {
        return Err(format!(
            "Invalid phone number '{}': expected E.164 format like +15551234567",
            input.trim()
        ));
    }
    Ok(normalized)
}
