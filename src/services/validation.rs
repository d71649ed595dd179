//! Input normalisation shared by services

use once_cell::sync::Lazy;
use regex::Regex;

use super::error::{ServiceError, ServiceResult};

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern compiles"));

/// Trim and lowercase an email, rejecting malformed addresses
pub fn normalize_email(email: &str) -> ServiceResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ServiceError::validation("Email is required"));
    }
    if email.len() > 254 || !EMAIL_RE.is_match(&email) {
        return Err(ServiceError::validation("Invalid email address"));
    }
    Ok(email)
}

/// Trimmed, non-empty text field
pub fn required(value: &str, field: &str) -> ServiceResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ServiceError::validation(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

/// Trimmed optional text; blank becomes `None`
pub fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
