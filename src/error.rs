//! Error types for the Lif Auth Server.

use thiserror::Error;

use crate::auth::{PasswordError, ValidationError};

/// Common error type for the auth server.
///
/// The business variants are expected outcomes that surface to clients as
/// 4xx responses. See [`LifError::is_infrastructure`] for the rest.
#[derive(Error, Debug)]
pub enum LifError {
    /// Username/password pair did not match a stored account.
    ///
    /// Unknown usernames collapse into this variant as well.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Session token did not match the account's active token.
    #[error("invalid token")]
    InvalidToken,

    /// The account is suspended.
    #[error("account suspended")]
    AccountSuspended,

    /// Referenced account does not exist.
    #[error("user not found")]
    UserNotFound,

    /// Referenced report does not exist.
    #[error("report not found")]
    ReportNotFound,

    /// Unique field already in use.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Caller lacks the required permission node or role.
    #[error("no permission: {0}")]
    NoPermission(String),

    /// Service token is not present in the capability map.
    #[error("unknown service token")]
    UnknownServiceToken,

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Database error.
    ///
    /// Errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Mail delivery error.
    #[error("mail error: {0}")]
    Mail(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl LifError {
    /// Whether this error is an infrastructure failure rather than a
    /// business outcome.
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            LifError::Database(_)
                | LifError::DatabaseConnection(_)
                | LifError::Io(_)
                | LifError::Config(_)
                | LifError::Mail(_)
                | LifError::Internal(_)
        )
    }
}

impl From<sqlx::Error> for LifError {
    fn from(e: sqlx::Error) -> Self {
        LifError::Database(e.to_string())
    }
}

impl From<ValidationError> for LifError {
    fn from(e: ValidationError) -> Self {
        LifError::Validation(e.to_string())
    }
}

impl From<PasswordError> for LifError {
    fn from(e: PasswordError) -> Self {
        match e {
            PasswordError::Empty | PasswordError::TooLong => LifError::Validation(e.to_string()),
            PasswordError::HashError(_) | PasswordError::InvalidHash => {
                LifError::Internal(e.to_string())
            }
        }
    }
}

/// Result type alias for auth server operations.
pub type Result<T> = std::result::Result<T, LifError>;
