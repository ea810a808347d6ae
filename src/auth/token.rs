//! Session tokens.
//!
//! Each account holds exactly one active token. Tokens never expire on
//! their own; resetting replaces the stored value in a single UPDATE, which
//! invalidates the previous token.

use rand::Rng;
use sqlx::SqlitePool;
use tracing::info;

use crate::db::{Account, AccountRepository};
use crate::{LifError, Result};

/// Number of random bytes in a session token.
pub const TOKEN_BYTES: usize = 8;

/// Generate a new session token (hex encoded).
pub fn generate_token() -> String {
    let bytes: [u8; TOKEN_BYTES] = rand::rng().random();
    hex::encode(bytes)
}

/// Check a presented session token.
///
/// Unknown usernames and mismatching tokens both fail with `InvalidToken`.
/// A matching token on a suspended account fails with `AccountSuspended`.
pub async fn check_token(pool: &SqlitePool, username: &str, token: &str) -> Result<Account> {
    let account = AccountRepository::new(pool)
        .get_by_username(username)
        .await?
        .filter(|account| account.token == token)
        .ok_or(LifError::InvalidToken)?;

    if account.is_suspended() {
        return Err(LifError::AccountSuspended);
    }

    Ok(account)
}

/// Get the active token of an account.
pub async fn retrieve_token(pool: &SqlitePool, username: &str) -> Result<String> {
    AccountRepository::new(pool)
        .get_by_username(username)
        .await?
        .map(|account| account.token)
        .ok_or(LifError::UserNotFound)
}

/// Replace the active token of an account and return the new one.
pub async fn reset_token(pool: &SqlitePool, username: &str) -> Result<String> {
    let token = generate_token();
    if !AccountRepository::new(pool).set_token(username, &token).await? {
        return Err(LifError::UserNotFound);
    }
    info!(username = %username, "session token reset");
    Ok(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{NewAccount, Role};
    use crate::Database;

    async fn setup(role: Role) -> Database {
        let db = Database::open_in_memory().await.unwrap();
        AccountRepository::new(db.pool())
            .create(&NewAccount::new("uid-1", "alice", "alice@x.com", "h", "s", "T1").with_role(role))
            .await
            .unwrap();
        db
    }

    #[test]
    fn test_generate_token() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_BYTES * 2);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_token());
    }

    #[tokio::test]
    async fn test_check_token() {
        let db = setup(Role::User).await;

        assert!(check_token(db.pool(), "alice", "T1").await.is_ok());
        assert!(matches!(
            check_token(db.pool(), "alice", "T2").await,
            Err(LifError::InvalidToken)
        ));
        assert!(matches!(
            check_token(db.pool(), "bob", "T1").await,
            Err(LifError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_check_token_suspended() {
        let db = setup(Role::Suspended).await;

        assert!(matches!(
            check_token(db.pool(), "alice", "T1").await,
            Err(LifError::AccountSuspended)
        ));
        assert!(matches!(
            check_token(db.pool(), "alice", "wrong").await,
            Err(LifError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn test_reset_invalidates_previous() {
        let db = setup(Role::User).await;

        let new_token = reset_token(db.pool(), "alice").await.unwrap();
        assert_ne!(new_token, "T1");
        assert!(matches!(
            check_token(db.pool(), "alice", "T1").await,
            Err(LifError::InvalidToken)
        ));
        assert!(check_token(db.pool(), "alice", &new_token).await.is_ok());
        assert_eq!(retrieve_token(db.pool(), "alice").await.unwrap(), new_token);
    }

    #[tokio::test]
    async fn test_unknown_account() {
        let db = setup(Role::User).await;
        assert!(matches!(
            reset_token(db.pool(), "bob").await,
            Err(LifError::UserNotFound)
        ));
        assert!(matches!(
            retrieve_token(db.pool(), "bob").await,
            Err(LifError::UserNotFound)
        ));
    }
}
