//! Two-factor setup.
//!
//! An account gets one TOTP secret the first time it asks for setup. Later
//! requests hand back the same provisioning URI so an authenticator app can
//! be re-enrolled.

use sqlx::SqlitePool;
use totp_rs::{Algorithm, Secret, TOTP};
use tracing::info;

use crate::db::{Account, AccountRepository};
use crate::{LifError, Result};

/// Issuer shown by authenticator apps.
pub const TOTP_ISSUER: &str = "Lif Platforms";

/// Domain appended to the username in the provisioning URI.
pub const TOTP_ACCOUNT_DOMAIN: &str = "lifplatforms.com";

/// Generate a random base32 secret.
pub fn generate_totp_secret() -> String {
    Secret::generate_secret().to_encoded().to_string()
}

fn totp_for(secret: &str, username: &str) -> Result<TOTP> {
    let bytes = Secret::Encoded(secret.to_string())
        .to_bytes()
        .map_err(|e| LifError::Internal(format!("stored TOTP secret is not base32: {e:?}")))?;

    TOTP::new(
        Algorithm::SHA1,
        6,
        1,
        30,
        bytes,
        Some(TOTP_ISSUER.to_string()),
        format!("{username}@{TOTP_ACCOUNT_DOMAIN}"),
    )
    .map_err(|e| LifError::Internal(format!("cannot build TOTP: {e}")))
}

/// Return the `otpauth://` provisioning URI for an account, creating and
/// storing its secret on first use.
pub async fn setup_two_factor(pool: &SqlitePool, account: &Account) -> Result<String> {
    let candidate = generate_totp_secret();
    let secret = AccountRepository::new(pool)
        .ensure_totp_secret(&account.user_id, &candidate)
        .await?
        .ok_or(LifError::UserNotFound)?;

    if secret == candidate {
        info!(username = %account.username, "two-factor secret created");
    }

    Ok(totp_for(&secret, &account.username)?.get_url())
}
