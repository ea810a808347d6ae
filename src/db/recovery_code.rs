//! Recovery code repository.
//!
//! Recovery codes are short numeric codes mailed to an account's address.
//! Each is bound to that email, expires, and can be consumed once. A code
//! is also retired after [`MAX_CODE_ATTEMPTS`] wrong guesses.

use sqlx::SqlitePool;

use crate::Result;

/// Wrong guesses a live code survives before it is retired.
pub const MAX_CODE_ATTEMPTS: i64 = 5;

/// Recovery code entity.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RecoveryCode {
    /// Code ID.
    pub id: i64,
    /// Email the code was sent to.
    pub email: String,
    /// The numeric code.
    pub code: String,
    /// Expiration timestamp (`YYYY-MM-DD HH:MM:SS`, UTC).
    pub expires_at: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Used timestamp (None if not used).
    pub used_at: Option<String>,
    /// Wrong guesses made against this code.
    pub failed_attempts: i64,
}

impl RecoveryCode {
    /// Check if the code has been used.
    pub fn is_used(&self) -> bool {
        self.used_at.is_some()
    }
}

/// Repository for recovery code operations.
pub struct RecoveryCodeRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> RecoveryCodeRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new code, retiring any earlier unused code for the same email.
    pub async fn create(&self, email: &str, code: &str, expires_at: &str) -> Result<RecoveryCode> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE recovery_codes SET used_at = datetime('now')
             WHERE email = ? AND used_at IS NULL",
        )
        .bind(email)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, RecoveryCode>(
            "INSERT INTO recovery_codes (email, code, expires_at) VALUES (?, ?, ?)
             RETURNING id, email, code, expires_at, created_at, used_at, failed_attempts",
        )
        .bind(email)
        .bind(code)
        .bind(expires_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row)
    }

    /// Consume a valid (unexpired, unused) code for an email.
    ///
    /// A miss counts against the email's live code, which is retired once
    /// it reaches [`MAX_CODE_ATTEMPTS`] misses. Each step is a single
    /// statement, so a code can be consumed at most once under concurrent
    /// requests.
    pub async fn consume(&self, email: &str, code: &str) -> Result<Option<RecoveryCode>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, RecoveryCode>(
            "UPDATE recovery_codes
             SET used_at = datetime('now')
             WHERE email = ?
               AND code = ?
               AND used_at IS NULL
               AND expires_at > datetime('now')
             RETURNING id, email, code, expires_at, created_at, used_at, failed_attempts",
        )
        .bind(email)
        .bind(code)
        .fetch_optional(&mut *tx)
        .await?;

        if row.is_none() {
            sqlx::query(
                "UPDATE recovery_codes
                 SET failed_attempts = failed_attempts + 1,
                     used_at = CASE WHEN failed_attempts + 1 >= ? THEN datetime('now') END
                 WHERE email = ?
                   AND used_at IS NULL
                   AND expires_at > datetime('now')",
            )
            .bind(MAX_CODE_ATTEMPTS)
            .bind(email)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(row)
    }

    /// Delete expired and used codes.
    pub async fn cleanup(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM recovery_codes WHERE expires_at < datetime('now') OR used_at IS NOT NULL",
        )
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
