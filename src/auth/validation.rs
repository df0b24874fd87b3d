//! Input validation for EUCLOUD registration and login.
//!
//! Emails double as usernames. They are trimmed and lower-cased before
//! storage and before lookup, so uniqueness is case-insensitive.

use thiserror::Error;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Email is empty.
    #[error("email is required")]
    EmailEmpty,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,
}

/// Normalize an email for storage and lookup.
///
/// # Examples
///
/// ```
/// use eucloud::auth::validation::normalize_email;
///
/// assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate email format.
///
/// # Examples
///
/// ```
/// use eucloud::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::EmailEmpty);
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }

    // Basic format check: must contain @ and have text before and after
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let (local, domain) = (parts[0], parts[1]);

    if local.is_empty() {
        return Err(ValidationError::EmailInvalidFormat);
    }

    // Domain must contain at least one dot and not be empty on either side
    if !domain.contains('.') {
        return Err(ValidationError::EmailInvalidFormat);
    }

    if domain.split('.').any(|p| p.is_empty()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    if email.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("USER@example.com"), "user@example.com");
        assert_eq!(normalize_email("\tuser@example.com\n"), "user@example.com");
    }

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("first.last+tag@mail.example.org").is_ok());
    }

    #[test]
    fn test_validate_email_empty() {
        assert_eq!(validate_email(""), Err(ValidationError::EmailEmpty));
    }

    #[test]
    fn test_validate_email_invalid_format() {
        for email in [
            "invalid",
            "@example.com",
            "user@",
            "user@localhost",
            "user@example..com",
            "a@b@example.com",
            "us er@example.com",
        ] {
            assert_eq!(
                validate_email(email),
                Err(ValidationError::EmailInvalidFormat),
                "{email}"
            );
        }
    }

    #[test]
    fn test_validate_email_too_long() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert_eq!(validate_email(&email), Err(ValidationError::EmailTooLong));
    }
}
