//! Account information and self-service updates.
//!
//! This module provides lookups of public account data, bulk lookups for
//! services, and the updates an account holder can make to their own
//! account.

use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;
use utoipa::ToSchema;

use super::password::{generate_salt, validate_password, PasswordScheme};
use super::validation::{validate_bio, validate_email, validate_pronouns};
use crate::db::{Account, AccountKey, AccountRepository, PermissionRepository, Role};
use crate::{LifError, Result};

/// Maximum number of results returned by a user search.
pub const SEARCH_LIMIT: i64 = 20;

/// Public account information with permissions.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    /// Opaque user id.
    pub user_id: String,
    /// Username.
    pub username: String,
    /// Pronouns.
    pub pronouns: Option<String>,
    /// Bio.
    pub bio: Option<String>,
    /// Role name.
    pub role: String,
    /// Granted permission nodes.
    pub permissions: Vec<String>,
}

/// A user search hit.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSearchResult {
    /// Opaque user id.
    pub user_id: String,
    /// Username.
    pub username: String,
    /// Role name.
    pub role: String,
    /// Granted permission nodes.
    pub permissions: Vec<String>,
}

async fn require_by_username(pool: &SqlitePool, username: &str) -> Result<Account> {
    AccountRepository::new(pool)
        .get_by_username(username)
        .await?
        .ok_or(LifError::UserNotFound)
}

/// Look up the user id of a username.
pub async fn get_user_id(pool: &SqlitePool, username: &str) -> Result<String> {
    Ok(require_by_username(pool, username).await?.user_id)
}

/// Look up the username of a user id.
pub async fn get_username(pool: &SqlitePool, user_id: &str) -> Result<String> {
    AccountRepository::new(pool)
        .get_by_user_id(user_id)
        .await?
        .map(|account| account.username)
        .ok_or(LifError::UserNotFound)
}

/// Get the bio of an account.
pub async fn get_bio(pool: &SqlitePool, username: &str) -> Result<Option<String>> {
    Ok(require_by_username(pool, username).await?.bio)
}

/// Get the pronouns of an account.
pub async fn get_pronouns(pool: &SqlitePool, username: &str) -> Result<Option<String>> {
    Ok(require_by_username(pool, username).await?.pronouns)
}

/// Get the role of an account.
pub async fn get_role(pool: &SqlitePool, username: &str) -> Result<Role> {
    Ok(require_by_username(pool, username).await?.role)
}

/// Get the email of an account.
pub async fn get_email(pool: &SqlitePool, username: &str) -> Result<String> {
    Ok(require_by_username(pool, username).await?.email)
}

/// Get public information and permissions of an account.
pub async fn get_user_info(pool: &SqlitePool, user_id: &str) -> Result<UserInfo> {
    let account = AccountRepository::new(pool)
        .get_by_user_id(user_id)
        .await?
        .ok_or(LifError::UserNotFound)?;
    let permissions = PermissionRepository::new(pool).nodes_for(user_id).await?;

    Ok(UserInfo {
        user_id: account.user_id,
        username: account.username,
        pronouns: account.pronouns,
        bio: account.bio,
        role: account.role.to_string(),
        permissions,
    })
}

/// Fetch the emails of several accounts. Unknown accounts are skipped.
pub async fn bulk_emails(pool: &SqlitePool, accounts: &[String], key: AccountKey) -> Result<Vec<String>> {
    AccountRepository::new(pool).emails_for(accounts, key).await
}

/// Search accounts by username prefix.
///
/// Wildcards in the query match literally. At most [`SEARCH_LIMIT`]
/// results are returned.
pub async fn search_users(pool: &SqlitePool, query: &str) -> Result<Vec<UserSearchResult>> {
    let escaped = query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let accounts = AccountRepository::new(pool)
        .search(&format!("{escaped}%"), SEARCH_LIMIT)
        .await?;

    let ids: Vec<String> = accounts.iter().map(|a| a.user_id.clone()).collect();
    let mut grants = PermissionRepository::new(pool).nodes_for_many(&ids).await?;

    Ok(accounts
        .into_iter()
        .map(|account| UserSearchResult {
            permissions: grants.remove(&account.user_id).unwrap_or_default(),
            user_id: account.user_id,
            username: account.username,
            role: account.role.to_string(),
        })
        .collect())
}

/// Update bio and pronouns of an account.
pub async fn update_personalization(
    pool: &SqlitePool,
    username: &str,
    bio: &str,
    pronouns: &str,
) -> Result<()> {
    validate_bio(bio)?;
    validate_pronouns(pronouns)?;

    let mut tx = pool.begin().await?;
    let updated = sqlx::query("UPDATE accounts SET bio = ?, pronouns = ? WHERE username = ?")
        .bind(bio)
        .bind(pronouns)
        .bind(username)
        .execute(&mut *tx)
        .await?;
    if updated.rows_affected() == 0 {
        return Err(LifError::UserNotFound);
    }
    tx.commit().await?;

    Ok(())
}

/// Update the bio of an account.
pub async fn update_bio(pool: &SqlitePool, username: &str, bio: &str) -> Result<()> {
    validate_bio(bio)?;
    if !AccountRepository::new(pool).set_bio(username, bio).await? {
        return Err(LifError::UserNotFound);
    }
    Ok(())
}

/// Update the pronouns of an account.
pub async fn update_pronouns(pool: &SqlitePool, username: &str, pronouns: &str) -> Result<()> {
    validate_pronouns(pronouns)?;
    if !AccountRepository::new(pool).set_pronouns(username, pronouns).await? {
        return Err(LifError::UserNotFound);
    }
    Ok(())
}

/// Set a new password, rotating the salt.
///
/// Hash and salt are written by one statement, so no reader can observe
/// the new hash with the old salt.
pub async fn update_password(
    pool: &SqlitePool,
    scheme: PasswordScheme,
    username: &str,
    new_password: &str,
) -> Result<()> {
    validate_password(new_password)?;

    let salt = generate_salt();
    let hash = scheme.hash(new_password, &salt)?;

    if !AccountRepository::new(pool).set_password(username, &hash, &salt).await? {
        return Err(LifError::UserNotFound);
    }

    info!(username = %username, "password updated");
    Ok(())
}

/// Change the email of an account.
///
/// Fails with `Conflict` when the address belongs to another account.
pub async fn update_email(pool: &SqlitePool, user_id: &str, email: &str) -> Result<()> {
    validate_email(email)?;

    let repo = AccountRepository::new(pool);
    if let Some(owner) = repo.get_by_email(email).await? {
        if owner.user_id != user_id {
            return Err(LifError::Conflict("email already in use".to_string()));
        }
        return Ok(());
    }

    if !repo.set_email(user_id, email).await? {
        return Err(LifError::UserNotFound);
    }

    info!(user_id = %user_id, "email updated");
    Ok(())
}
