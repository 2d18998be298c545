//! Input validation utilities

use once_cell::sync::Lazy;
use regex::Regex;
use validator::ValidationError;

/// Regex for `#RGB` / `#RRGGBB` colour literals
static HEX_COLOR_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").unwrap());

/// Longest accepted username, in characters
pub const MAX_USERNAME_LEN: usize = 50;

/// Validate a tag colour
pub fn validate_hex_color(color: &str) -> bool {
    HEX_COLOR_REGEX.is_match(color)
}

/// Validate a username
pub fn validate_username(username: &str) -> bool {
    !username.trim().is_empty() && username.chars().count() <= MAX_USERNAME_LEN
}

/// `validator` hook for colour fields
pub fn hex_color(color: &str) -> Result<(), ValidationError> {
    if validate_hex_color(color) {
        Ok(())
    } else {
        Err(ValidationError::new("hex_color")
            .with_message("color must be a hex literal such as #3B82F6".into()))
    }
}

/// `validator` hook for username fields
pub fn username(username: &str) -> Result<(), ValidationError> {
    if validate_username(username) {
        Ok(())
    } else {
        Err(ValidationError::new("username")
            .with_message("username must be 1-50 characters and not blank".into()))
    }
}

/// `validator` hook rejecting whitespace-only text
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank").with_message("must not be blank".into()))
    } else {
        Ok(())
    }
}

/// Unicode lowercase form stored alongside searchable text
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

/// Escape `%`, `_` and `\` so user text matches literally inside `LIKE ... ESCAPE '\'`.
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
