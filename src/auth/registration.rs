//! Account registration.

use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

use super::password::{generate_salt, validate_password, PasswordScheme};
use super::token::generate_token;
use super::validation::{validate_email, validate_pronouns, validate_username};
use crate::db::{Account, AccountRepository, NewAccount};
use crate::Result;

/// Registration request data.
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Desired username.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Optional pronouns. The placeholder is used when absent.
    pub pronouns: Option<String>,
}

impl RegistrationRequest {
    /// Create a new registration request.
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
            pronouns: None,
        }
    }

    /// Set the pronouns.
    pub fn with_pronouns(mut self, pronouns: impl Into<String>) -> Self {
        self.pronouns = Some(pronouns.into());
        self
    }

    /// Validate every field.
    pub fn validate(&self) -> Result<()> {
        validate_username(&self.username)?;
        validate_email(&self.email)?;
        validate_password(&self.password)?;
        if let Some(pronouns) = &self.pronouns {
            validate_pronouns(pronouns)?;
        }
        Ok(())
    }
}

/// Register a new account.
///
/// This function:
/// 1. Validates all input fields
/// 2. Generates the user id, salt and first session token
/// 3. Hashes the password
/// 4. Inserts the account, failing with `Conflict` on a taken username or email
///
/// The returned account carries the session token.
pub async fn create_account(
    pool: &SqlitePool,
    scheme: PasswordScheme,
    request: &RegistrationRequest,
) -> Result<Account> {
    request.validate()?;

    let salt = generate_salt();
    let password_hash = scheme.hash(&request.password, &salt)?;

    let mut new_account = NewAccount::new(
        Uuid::new_v4().to_string(),
        &request.username,
        &request.email,
        password_hash,
        salt,
        generate_token(),
    );
    if let Some(pronouns) = &request.pronouns {
        new_account = new_account.with_pronouns(pronouns);
    }

    let account = AccountRepository::new(pool).create(&new_account).await?;

    info!(username = %account.username, user_id = %account.user_id, "account created");
    Ok(account)
}

/// Check if a username is already registered.
pub async fn username_in_use(pool: &SqlitePool, username: &str) -> Result<bool> {
    AccountRepository::new(pool).username_exists(username).await
}

/// Check if an email is already registered.
pub async fn email_in_use(pool: &SqlitePool, email: &str) -> Result<bool> {
    AccountRepository::new(pool).email_exists(email).await
}
