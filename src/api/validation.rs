//! Input validation for registration requests.

use lazy_static::lazy_static;
use regex::Regex;

use crate::db::RegisterRequest;

use super::error::ApiError;

lazy_static! {
    /// Regex for validating usernames (alphanumeric with dashes/underscores, 2-30 chars)
    static ref USERNAME_REGEX: Regex = Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9_-]{1,29}$").unwrap();

    /// Loose email shape check; the unique constraint is the real gate.
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
}

/// Validate a username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(
            "Username must be 2-30 characters: letters, digits, dashes, underscores".to_string(),
        );
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 || !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email address".to_string());
    }

    Ok(())
}

/// Validate a password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }

    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }

    Ok(())
}

/// Validate a full registration request
pub fn validate_registration(req: &RegisterRequest) -> Result<(), ApiError> {
    validate_username(&req.username).map_err(ApiError::validation)?;
    validate_email(&req.email).map_err(ApiError::validation)?;
    validate_password(&req.password).map_err(ApiError::validation)?;
    Ok(())
}
