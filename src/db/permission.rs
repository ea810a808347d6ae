//! Permission grant repository.
//!
//! Grants are `(account_id, node)` pairs keyed by the account's opaque user
//! id. Nodes are flat, case-sensitive strings.

use std::collections::{BTreeSet, HashMap};

use sqlx::{QueryBuilder, SqliteConnection, SqlitePool};

use super::account::Role;
use crate::Result;

/// Repository for permission grants.
pub struct PermissionRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> PermissionRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Grant a node. Granting an already held node is a no-op.
    pub async fn add(&self, account_id: &str, node: &str) -> Result<()> {
        sqlx::query("INSERT OR IGNORE INTO permissions (account_id, node) VALUES (?, ?)")
            .bind(account_id)
            .bind(node)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Revoke a node. Returns true if the grant existed.
    pub async fn remove(&self, account_id: &str, node: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM permissions WHERE account_id = ? AND node = ?")
            .bind(account_id)
            .bind(node)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Check a single grant.
    pub async fn has(&self, account_id: &str, node: &str) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM permissions WHERE account_id = ? AND node = ?)",
        )
        .bind(account_id)
        .bind(node)
        .fetch_one(self.pool)
        .await?;
        Ok(exists.0)
    }

    /// Check that every requested node is granted.
    ///
    /// An empty request is trivially satisfied. Duplicate nodes in the
    /// request count once.
    pub async fn has_all<S: AsRef<str>>(&self, account_id: &str, nodes: &[S]) -> Result<bool> {
        let wanted: BTreeSet<&str> = nodes.iter().map(AsRef::as_ref).collect();
        if wanted.is_empty() {
            return Ok(true);
        }

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT COUNT(DISTINCT node) FROM permissions WHERE account_id = ");
        query.push_bind(account_id);
        query.push(" AND node IN (");
        let mut separated = query.separated(", ");
        for node in &wanted {
            separated.push_bind(*node);
        }
        separated.push_unseparated(")");

        let held: (i64,) = query.build_query_as().fetch_one(self.pool).await?;
        Ok(held.0 as usize == wanted.len())
    }

    /// List the nodes granted to an account.
    pub async fn nodes_for(&self, account_id: &str) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT node FROM permissions WHERE account_id = ? ORDER BY node")
                .bind(account_id)
                .fetch_all(self.pool)
                .await?;
        Ok(rows.into_iter().map(|(node,)| node).collect())
    }

    /// List the nodes granted to several accounts, keyed by account id.
    ///
    /// Accounts without grants are absent from the map.
    pub async fn nodes_for_many(&self, account_ids: &[String]) -> Result<HashMap<String, Vec<String>>> {
        let mut grants: HashMap<String, Vec<String>> = HashMap::new();
        if account_ids.is_empty() {
            return Ok(grants);
        }

        let mut query: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT account_id, node FROM permissions WHERE account_id IN (");
        let mut separated = query.separated(", ");
        for id in account_ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(") ORDER BY node");

        let rows: Vec<(String, String)> = query.build_query_as().fetch_all(self.pool).await?;
        for (account_id, node) in rows {
            grants.entry(account_id).or_default().push(node);
        }
        Ok(grants)
    }

    /// Replace every grant of an account in one transaction.
    pub async fn replace(&self, account_id: &str, nodes: &[String]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        replace_nodes_in(&mut tx, account_id, nodes).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Replace every grant of an account on an existing connection.
///
/// Callers own the surrounding transaction.
pub(crate) async fn replace_nodes_in(
    conn: &mut SqliteConnection,
    account_id: &str,
    nodes: &[String],
) -> Result<()> {
    sqlx::query("DELETE FROM permissions WHERE account_id = ?")
        .bind(account_id)
        .execute(&mut *conn)
        .await?;

    for node in nodes {
        sqlx::query("INSERT OR IGNORE INTO permissions (account_id, node) VALUES (?, ?)")
            .bind(account_id)
            .bind(node)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Set an account's role on an existing connection.
///
/// Returns false if no account has the given id.
pub(crate) async fn set_role_in(conn: &mut SqliteConnection, account_id: &str, role: Role) -> Result<bool> {
    let result = sqlx::query("UPDATE accounts SET role = ? WHERE user_id = ?")
        .bind(role.as_str())
        .bind(account_id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
