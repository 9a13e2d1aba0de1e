//! Input validation utilities

use regex::Regex;
use std::sync::OnceLock;

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err("Username can only contain letters, numbers, and underscores".to_string());
    }

    Ok(())
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email must be at most 254 characters long".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Reject blank text fields
pub fn validate_required(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} is required"));
    }

    Ok(())
}

/// Validate a limit/offset pair
pub fn validate_page(limit: i64, offset: i64) -> Result<(), String> {
    if limit < 0 {
        return Err("Limit must not be negative".to_string());
    }

    if offset < 0 {
        return Err("Offset must not be negative".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("jake").is_ok());
        assert!(validate_username("j").is_ok());
        assert!(validate_username("user_123").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("user name").is_err());
        assert!(validate_username("user@name").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("jake@jake.jake").is_ok());
        assert!(validate_email("user.name+tag@example.co.uk").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("invalid@").is_err());
        assert!(validate_email("@example.com").is_err());
    }

    #[test]
    fn test_validate_required() {
        assert!(validate_required("Title", "How to train your dragon").is_ok());
        assert_eq!(
            validate_required("Title", "   ").unwrap_err(),
            "Title is required"
        );
    }

    #[test]
    fn test_validate_page() {
        assert!(validate_page(0, 0).is_ok());
        assert!(validate_page(20, 40).is_ok());
        assert!(validate_page(-1, 0).is_err());
        assert!(validate_page(10, -5).is_err());
    }
}
