//! Credential verification.

use sqlx::SqlitePool;
use tracing::{debug, warn};

use super::password::PasswordScheme;
use crate::db::{Account, AccountRepository};
use crate::{LifError, Result};

/// Verify a username/password pair.
///
/// Unknown usernames and wrong passwords both fail with
/// `InvalidCredentials`. A correct password on a suspended account fails
/// with `AccountSuspended`. Read-only.
pub async fn verify_credentials(
    pool: &SqlitePool,
    scheme: PasswordScheme,
    username: &str,
    password: &str,
) -> Result<Account> {
    let repo = AccountRepository::new(pool);
    let Some(account) = repo.get_by_username(username).await? else {
        debug!(username = %username, "credential check for unknown account");
        return Err(LifError::InvalidCredentials);
    };

    let matches = match scheme.verify(password, &account.salt, &account.password_hash) {
        Ok(matches) => matches,
        Err(e) => {
            warn!(username = %username, error = %e, "stored password hash is unreadable");
            false
        }
    };

    if !matches {
        return Err(LifError::InvalidCredentials);
    }

    if account.is_suspended() {
        return Err(LifError::AccountSuspended);
    }

    Ok(account)
}
