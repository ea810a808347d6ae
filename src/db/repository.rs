//! Account repository for the Lif Auth Server.
//!
//! This module provides CRUD operations for accounts in the database.

use sqlx::{QueryBuilder, SqlitePool};

use super::account::{Account, AccountKey, AccountRow, NewAccount, Role};
use crate::{LifError, Result};

const ACCOUNT_COLUMNS: &str = "id, user_id, username, email, password, salt, token, role, bio, \
                               pronouns, created_at";

/// Repository for account CRUD operations.
pub struct AccountRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new AccountRepository with the given pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account.
    ///
    /// The uniqueness checks and the insert run in one transaction. A
    /// duplicate username or email fails with `Conflict` and writes nothing.
    pub async fn create(&self, new_account: &NewAccount) -> Result<Account> {
        let mut tx = self.pool.begin().await?;

        let taken: (bool, bool) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM accounts WHERE username = ?),
                    EXISTS(SELECT 1 FROM accounts WHERE email = ?)",
        )
        .bind(&new_account.username)
        .bind(&new_account.email)
        .fetch_one(&mut *tx)
        .await?;

        match taken {
            (true, _) => return Err(LifError::Conflict("username already in use".to_string())),
            (_, true) => return Err(LifError::Conflict("email already in use".to_string())),
            _ => {}
        }

        let result = sqlx::query(
            "INSERT INTO accounts (user_id, username, email, password, salt, token, role, pronouns)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new_account.user_id)
        .bind(&new_account.username)
        .bind(&new_account.email)
        .bind(&new_account.password_hash)
        .bind(&new_account.salt)
        .bind(&new_account.token)
        .bind(new_account.role.as_str())
        .bind(&new_account.pronouns)
        .execute(&mut *tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                LifError::Conflict("username or email already in use".to_string())
            }
            _ => LifError::from(e),
        })?;

        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?"
        ))
        .bind(result.last_insert_rowid())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        row.into_account()
    }

    /// Get an account by username.
    pub async fn get_by_username(&self, username: &str) -> Result<Option<Account>> {
        self.get_by(AccountKey::Username, username).await
    }

    /// Get an account by its opaque user id.
    pub async fn get_by_user_id(&self, user_id: &str) -> Result<Option<Account>> {
        self.get_by(AccountKey::UserId, user_id).await
    }

    /// Get an account by email.
    pub async fn get_by_email(&self, email: &str) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(AccountRow::into_account).transpose()
    }

    async fn get_by(&self, key: AccountKey, value: &str) -> Result<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE {} = ?",
            key.column()
        ))
        .bind(value)
        .fetch_optional(self.pool)
        .await?;

        row.map(AccountRow::into_account).transpose()
    }

    /// Check if a username is already taken.
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM accounts WHERE username = ?)")
                .bind(username)
                .fetch_one(self.pool)
                .await?;
        Ok(exists.0)
    }

    /// Check if an email is already taken.
    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM accounts WHERE email = ?)")
            .bind(email)
            .fetch_one(self.pool)
            .await?;
        Ok(exists.0)
    }

    /// Check if an account with the given user id exists.
    pub async fn user_id_exists(&self, user_id: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM accounts WHERE user_id = ?)")
                .bind(user_id)
                .fetch_one(self.pool)
                .await?;
        Ok(exists.0)
    }

    /// Replace the session token. Returns false if the account does not exist.
    pub async fn set_token(&self, username: &str, token: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET token = ? WHERE username = ?")
            .bind(token)
            .bind(username)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace password hash and salt together.
    pub async fn set_password(&self, username: &str, password_hash: &str, salt: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET password = ?, salt = ? WHERE username = ?")
            .bind(password_hash)
            .bind(salt)
            .bind(username)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the email of an account.
    pub async fn set_email(&self, user_id: &str, email: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET email = ? WHERE user_id = ?")
            .bind(email)
            .bind(user_id)
            .execute(self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    LifError::Conflict("email already in use".to_string())
                }
                _ => LifError::from(e),
            })?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the bio of an account.
    pub async fn set_bio(&self, username: &str, bio: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET bio = ? WHERE username = ?")
            .bind(bio)
            .bind(username)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace the pronouns of an account.
    pub async fn set_pronouns(&self, username: &str, pronouns: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET pronouns = ? WHERE username = ?")
            .bind(pronouns)
            .bind(username)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the role of an account by user id.
    pub async fn set_role(&self, user_id: &str, role: Role) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET role = ? WHERE user_id = ?")
            .bind(role.as_str())
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Store a TOTP secret unless the account already has one.
    ///
    /// Returns the secret the account ends up with, or `None` if the
    /// account does not exist.
    pub async fn ensure_totp_secret(&self, user_id: &str, candidate: &str) -> Result<Option<String>> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "UPDATE accounts SET totp_secret = COALESCE(totp_secret, ?)
             WHERE user_id = ?
             RETURNING totp_secret",
        )
        .bind(candidate)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.and_then(|(secret,)| secret))
    }

    /// Fetch the emails of several accounts at once.
    ///
    /// Unknown accounts are skipped.
    pub async fn emails_for(&self, accounts: &[String], key: AccountKey) -> Result<Vec<String>> {
        if accounts.is_empty() {
            return Ok(vec![]);
        }

        let mut query: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new("SELECT email FROM accounts WHERE ");
        query.push(key.column());
        query.push(" IN (");
        let mut separated = query.separated(", ");
        for account in accounts {
            separated.push_bind(account);
        }
        separated.push_unseparated(") ORDER BY id");

        let rows: Vec<(String,)> = query.build_query_as().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(|(email,)| email).collect())
    }

    /// Search accounts whose username matches a LIKE pattern.
    ///
    /// A backslash escapes `%` and `_` inside the pattern.
    pub async fn search(&self, pattern: &str, limit: i64) -> Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE username LIKE ? ESCAPE '\\'
             ORDER BY username LIMIT ?"
        ))
        .bind(pattern)
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(AccountRow::into_account).collect()
    }

    /// List every account.
    pub async fn list_all(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(AccountRow::into_account).collect()
    }

    /// Count all accounts.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(self.pool)
            .await?;
        Ok(count.0)
    }
}
