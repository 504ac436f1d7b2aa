//! Input normalisation and validation for account identity fields.

use validator::ValidateEmail;

use crate::error::CoreError;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum accepted email length (RFC 5321 path limit).
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Normalise an email for storage and lookup: trimmed and lower-cased.
///
/// Account emails are compared case-insensitively, so every write and read
/// of `users.email` / `top_up_requests.email` goes through this function.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Normalise and validate an email address.
pub fn validate_email(email: &str) -> Result<String, CoreError> {
    let normalized = normalize_email(email);
    if normalized.is_empty() {
        return Err(CoreError::Validation("Email required".into()));
    }
    if normalized.len() > MAX_EMAIL_LENGTH || !normalized.validate_email() {
        return Err(CoreError::Validation(format!(
            "'{normalized}' is not a valid email address"
        )));
    }
    Ok(normalized)
}

/// Validate that a password meets minimum strength requirements.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), CoreError> {
    if password.chars().count() < min_length {
        return Err(CoreError::Validation(format!(
            "Password must be at least {min_length} characters long"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_case_and_whitespace() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn accepts_valid_email() {
        assert_eq!(validate_email("Bob@shop.io").unwrap(), "bob@shop.io");
    }

    #[test]
    fn rejects_empty_and_malformed() {
        assert!(validate_email("   ").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@signs.com").is_err());
    }

    #[test]
    fn password_minimum_is_inclusive() {
        assert!(validate_password_strength("12345678", MIN_PASSWORD_LENGTH).is_ok());
        let err = validate_password_strength("1234567", MIN_PASSWORD_LENGTH).unwrap_err();
        assert!(err.to_string().contains("at least 8 characters"));
    }
}
