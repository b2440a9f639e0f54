//! Format predicates for form input.
//!
//! The repository does not enforce these on write paths; CSV-sourced rows are
//! stored as-is. They exist for callers that validate before saving.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));
static MOBILE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{7,15}$").expect("valid mobile regex"));

/// Returns whether `email` looks like `local@domain.tld`. Blank is invalid.
pub fn is_valid_email(email: &str) -> bool {
    !email.trim().is_empty() && EMAIL_PATTERN.is_match(email)
}

/// Returns whether `mobile` is 7 to 15 ASCII digits. Blank is invalid.
pub fn is_valid_mobile(mobile: &str) -> bool {
    !mobile.trim().is_empty() && MOBILE_PATTERN.is_match(mobile)
}
