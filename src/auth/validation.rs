//! Input validation for account data.
//!
//! This module provides validation functions for usernames, email
//! addresses, bios, pronouns and permission nodes.

use thiserror::Error;

/// Maximum username length.
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Maximum email length.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum bio length in characters.
pub const MAX_BIO_LENGTH: usize = 1000;

/// Maximum pronouns length in characters.
pub const MAX_PRONOUNS_LENGTH: usize = 50;

/// Maximum permission node length.
pub const MAX_NODE_LENGTH: usize = 128;

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Username is empty.
    #[error("username cannot be empty")]
    UsernameEmpty,

    /// Username is too long.
    #[error("username must be at most {MAX_USERNAME_LENGTH} characters")]
    UsernameTooLong,

    /// Username contains invalid characters.
    #[error("username can only contain letters, digits, '.' and '_'")]
    UsernameInvalidChars,

    /// Email is too long.
    #[error("email must be at most {MAX_EMAIL_LENGTH} characters")]
    EmailTooLong,

    /// Email format is invalid.
    #[error("invalid email format")]
    EmailInvalidFormat,

    /// Bio is too long.
    #[error("bio must be at most {MAX_BIO_LENGTH} characters")]
    BioTooLong,

    /// Pronouns are too long.
    #[error("pronouns must be at most {MAX_PRONOUNS_LENGTH} characters")]
    PronounsTooLong,

    /// Permission node is empty, too long or contains whitespace.
    #[error("invalid permission node")]
    NodeInvalid,
}

/// Check whether a character may appear in a username.
///
/// The same set is used to sanitize usernames before they reach the
/// filesystem.
pub fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.'
}

/// Validate a username.
///
/// # Examples
///
/// ```
/// use lif_auth::auth::validation::validate_username;
///
/// assert!(validate_username("alice").is_ok());
/// assert!(validate_username("").is_err());
/// assert!(validate_username("../etc").is_err());
/// ```
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.is_empty() {
        return Err(ValidationError::UsernameEmpty);
    }
    if username.len() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::UsernameTooLong);
    }
    if !username.chars().all(is_username_char) || username.starts_with('.') {
        return Err(ValidationError::UsernameInvalidChars);
    }
    Ok(())
}

/// Validate an email address.
///
/// Performs a format check only. Deliverability is not verified.
///
/// # Examples
///
/// ```
/// use lif_auth::auth::validation::validate_email;
///
/// assert!(validate_email("user@example.com").is_ok());
/// assert!(validate_email("invalid").is_err());
/// ```
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::EmailTooLong);
    }

    if email.chars().any(|c| c.is_whitespace()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::EmailInvalidFormat);
    };

    if local.is_empty() || domain.contains('@') {
        return Err(ValidationError::EmailInvalidFormat);
    }

    // Domain needs at least one dot with text on both sides of each
    if !domain.contains('.') || domain.split('.').any(|p| p.is_empty()) {
        return Err(ValidationError::EmailInvalidFormat);
    }

    Ok(())
}

/// Validate a bio.
pub fn validate_bio(bio: &str) -> Result<(), ValidationError> {
    if bio.chars().count() > MAX_BIO_LENGTH {
        return Err(ValidationError::BioTooLong);
    }
    Ok(())
}

/// Validate pronouns.
pub fn validate_pronouns(pronouns: &str) -> Result<(), ValidationError> {
    if pronouns.chars().count() > MAX_PRONOUNS_LENGTH {
        return Err(ValidationError::PronounsTooLong);
    }
    Ok(())
}

/// Validate a permission node.
pub fn validate_node(node: &str) -> Result<(), ValidationError> {
    if node.is_empty() || node.len() > MAX_NODE_LENGTH || node.chars().any(char::is_whitespace) {
        return Err(ValidationError::NodeInvalid);
    }
    Ok(())
}
