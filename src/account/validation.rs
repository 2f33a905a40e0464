//! Input checks applied before any storage access.

use super::hasher::MAX_PASSWORD_BYTES;
use regex::Regex;

const PHONE_SEPARATORS: [char; 5] = [' ', '-', '.', '(', ')'];

/// Normalize a phone number to an optional `+` followed by 7 to 15 digits.
///
/// Common separators are dropped; anything else makes the number invalid.
pub fn normalize_phone_number(raw: &str) -> Option<String> {
    let normalized: String = raw
        .trim()
        .chars()
        .filter(|c| !PHONE_SEPARATORS.contains(c))
        .collect();

    Regex::new(r"^\+?[0-9]{7,15}$")
        .is_ok_and(|re| re.is_match(&normalized))
        .then_some(normalized)
}

/// New passwords must be non-empty and fit in a single bcrypt input.
pub fn valid_new_password(password: &str) -> bool {
    !password.is_empty() && password.len() <= MAX_PASSWORD_BYTES
}
