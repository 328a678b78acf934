use bcrypt::{hash, verify, BcryptError};

use crate::config;

/// Minimum password length accepted at registration / password change
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a password with the configured bcrypt cost
pub fn hash_password(password: &str) -> Result<String, BcryptError> {
    hash(password, config::config().security.bcrypt_cost)
}

/// Verify a password against a stored bcrypt hash
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, BcryptError> {
    verify(password, stored_hash)
}

/// Check password strength requirements
pub fn validate_password_strength(password: &str) -> Result<(), String> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        ));
    }
    Ok(())
}

/// Basic email format check
pub fn validate_email_format(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email cannot be empty".to_string());
    }

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() || !parts[1].contains('.') {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_reasonable_emails() {
        assert!(validate_email_format("user@example.com").is_ok());
        assert!(validate_email_format("a.b+c@sub.domain.jp").is_ok());
    }

    #[test]
    fn rejects_malformed_emails() {
        assert!(validate_email_format("").is_err());
        assert!(validate_email_format("no-at-sign").is_err());
        assert!(validate_email_format("@missing.local").is_err());
        assert!(validate_email_format("user@nodot").is_err());
        assert!(validate_email_format("two@@ats.com").is_err());
    }

    #[test]
    fn enforces_minimum_length() {
        assert!(validate_password_strength("short").is_err());
        assert!(validate_password_strength("longenough").is_ok());
    }

    #[test]
    fn hash_and_verify_round_trip() {
        // Cost 4 keeps the test fast; production cost comes from config
        let hashed = bcrypt::hash("s3cret-pass", 4).unwrap();
        assert!(verify_password("s3cret-pass", &hashed).unwrap());
        assert!(!verify_password("wrong-pass", &hashed).unwrap());
    }
}
