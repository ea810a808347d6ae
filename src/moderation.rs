//! Moderation and role authority.
//!
//! Operations here trust their caller: the acting account's role or
//! permission nodes are checked by the web layer before anything in this
//! module runs.

use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::auth::validation::validate_node;
use crate::db::{
    replace_nodes_in, set_role_in, AccountRepository, NewReport, PermissionRepository, Report,
    ReportFilter, ReportRepository, Role, DEFAULT_REPORT_LIMIT,
};
use crate::{LifError, Result};

/// How a batch of privilege updates is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Each account is updated in its own transaction. Unknown accounts
    /// are skipped and reported.
    #[default]
    PerAccount,
    /// The whole batch is one transaction. An unknown account aborts it.
    AllOrNothing,
}

/// Set the role of an account.
pub async fn set_role(pool: &SqlitePool, account_id: &str, role: Role) -> Result<()> {
    if !AccountRepository::new(pool).set_role(account_id, role).await? {
        return Err(LifError::UserNotFound);
    }
    info!(account_id = %account_id, role = %role, "role changed");
    Ok(())
}

/// Suspend an account.
pub async fn suspend(pool: &SqlitePool, account_id: &str) -> Result<()> {
    set_role(pool, account_id, Role::Suspended).await
}

/// Suspend an account named by username.
pub async fn suspend_user(pool: &SqlitePool, username: &str) -> Result<()> {
    let account = AccountRepository::new(pool)
        .get_by_username(username)
        .await?
        .ok_or(LifError::UserNotFound)?;
    suspend(pool, &account.user_id).await
}

/// Grant a permission node to an account.
pub async fn grant_node(pool: &SqlitePool, account_id: &str, node: &str) -> Result<()> {
    validate_node(node)?;
    if !AccountRepository::new(pool).user_id_exists(account_id).await? {
        return Err(LifError::UserNotFound);
    }
    PermissionRepository::new(pool).add(account_id, node).await?;
    info!(account_id = %account_id, node = %node, "permission granted");
    Ok(())
}

/// Revoke a permission node from an account.
///
/// Revoking a node the account does not hold succeeds.
pub async fn revoke_node(pool: &SqlitePool, account_id: &str, node: &str) -> Result<()> {
    if !AccountRepository::new(pool).user_id_exists(account_id).await? {
        return Err(LifError::UserNotFound);
    }
    PermissionRepository::new(pool).remove(account_id, node).await?;
    info!(account_id = %account_id, node = %node, "permission revoked");
    Ok(())
}

/// Submit a report about a user.
///
/// The service must be one of `accepted_services` and the reported user
/// must exist.
pub async fn submit_report(
    pool: &SqlitePool,
    accepted_services: &[String],
    report: &NewReport,
) -> Result<Report> {
    if !accepted_services.iter().any(|s| s == &report.service) {
        return Err(LifError::Validation(format!(
            "unknown service: {}",
            report.service
        )));
    }
    if !AccountRepository::new(pool).username_exists(&report.user).await? {
        return Err(LifError::UserNotFound);
    }

    let report = ReportRepository::new(pool).create(report).await?;
    info!(report_id = report.id, user = %report.user, service = %report.service, "report submitted");
    Ok(report)
}

/// List reports, oldest first, up to [`DEFAULT_REPORT_LIMIT`].
pub async fn list_reports(pool: &SqlitePool, filter: Option<ReportFilter>) -> Result<Vec<Report>> {
    ReportRepository::new(pool)
        .list(filter, DEFAULT_REPORT_LIMIT)
        .await
}

/// Get a report by id.
pub async fn get_report(pool: &SqlitePool, id: i64) -> Result<Report> {
    ReportRepository::new(pool)
        .get_by_id(id)
        .await?
        .ok_or(LifError::ReportNotFound)
}

/// Mark a report resolved. Resolving twice is not an error.
pub async fn resolve_report(pool: &SqlitePool, id: i64) -> Result<()> {
    if !ReportRepository::new(pool).resolve(id).await? {
        return Err(LifError::ReportNotFound);
    }
    info!(report_id = id, "report resolved");
    Ok(())
}

/// New role and permission set for one account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeUpdate {
    /// Target account id.
    pub user_id: String,
    /// New role; unchanged when absent.
    #[serde(default)]
    pub role: Option<Role>,
    /// Complete replacement permission set.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// Result of a privilege batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeOutcome {
    /// Accounts that were updated.
    pub updated: Vec<String>,
    /// Accounts that do not exist and were skipped.
    pub not_found: Vec<String>,
}

/// Replace roles and permission sets of several accounts.
///
/// Each account's update is atomic in both modes. See [`BatchMode`] for
/// how the batch as a whole behaves.
pub async fn manage_privileges(
    pool: &SqlitePool,
    updates: &[PrivilegeUpdate],
    mode: BatchMode,
) -> Result<PrivilegeOutcome> {
    for update in updates {
        for node in &update.permissions {
            validate_node(node)?;
        }
    }

    let outcome = match mode {
        BatchMode::PerAccount => apply_per_account(pool, updates).await?,
        BatchMode::AllOrNothing => apply_all_or_nothing(pool, updates).await?,
    };

    info!(
        updated = outcome.updated.len(),
        not_found = outcome.not_found.len(),
        "privileges updated"
    );
    Ok(outcome)
}

async fn apply_per_account(pool: &SqlitePool, updates: &[PrivilegeUpdate]) -> Result<PrivilegeOutcome> {
    let mut outcome = PrivilegeOutcome::default();

    for update in updates {
        let mut tx = pool.begin().await?;
        if apply_one(&mut tx, update).await? {
            tx.commit().await?;
            outcome.updated.push(update.user_id.clone());
        } else {
            tx.rollback().await?;
            warn!(account_id = %update.user_id, "privilege update skipped, account not found");
            outcome.not_found.push(update.user_id.clone());
        }
    }

    Ok(outcome)
}

async fn apply_all_or_nothing(pool: &SqlitePool, updates: &[PrivilegeUpdate]) -> Result<PrivilegeOutcome> {
    let mut outcome = PrivilegeOutcome::default();
    let mut tx = pool.begin().await?;

    for update in updates {
        if !apply_one(&mut tx, update).await? {
            tx.rollback().await?;
            warn!(account_id = %update.user_id, "privilege batch aborted, account not found");
            return Err(LifError::UserNotFound);
        }
        outcome.updated.push(update.user_id.clone());
    }

    tx.commit().await?;
    Ok(outcome)
}

/// Apply one update on the caller's transaction. Returns false if the
/// account does not exist.
async fn apply_one(conn: &mut sqlx::SqliteConnection, update: &PrivilegeUpdate) -> Result<bool> {
    let exists: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM accounts WHERE user_id = ?")
        .bind(&update.user_id)
        .fetch_optional(&mut *conn)
        .await?;
    if exists.is_none() {
        return Ok(false);
    }

    if let Some(role) = update.role {
        set_role_in(&mut *conn, &update.user_id, role).await?;
    }
    replace_nodes_in(&mut *conn, &update.user_id, &update.permissions).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{check_token, create_account, verify_credentials, PasswordScheme, RegistrationRequest};
    use crate::db::Account;
    use crate::Database;

    async fn setup() -> (Database, Account, Account) {
        let db = Database::open_in_memory().await.unwrap();
        let alice = create_account(
            db.pool(),
            PasswordScheme::Sha256,
            &RegistrationRequest::new("alice", "alice@x.com", "pw123"),
        )
        .await
        .unwrap();
        let bob = create_account(
            db.pool(),
            PasswordScheme::Sha256,
            &RegistrationRequest::new("bob", "bob@x.com", "pw"),
        )
        .await
        .unwrap();
        (db, alice, bob)
    }

    fn accepted() -> Vec<String> {
        vec!["Ringer".to_string(), "Support".to_string()]
    }

    async fn nodes(db: &Database, account_id: &str) -> Vec<String> {
        PermissionRepository::new(db.pool())
            .nodes_for(account_id)
            .await
            .unwrap()
    }

    #[test]
    fn test_batch_mode_default() {
        assert_eq!(BatchMode::default(), BatchMode::PerAccount);
    }

    #[tokio::test]
    async fn test_suspend_blocks_login() {
        let (db, alice, _) = setup().await;

        suspend(db.pool(), &alice.user_id).await.unwrap();

        assert!(matches!(
            verify_credentials(db.pool(), PasswordScheme::Sha256, "alice", "pw123").await,
            Err(LifError::AccountSuspended)
        ));
        assert!(matches!(
            check_token(db.pool(), "alice", &alice.token).await,
            Err(LifError::AccountSuspended)
        ));
    }

    #[tokio::test]
    async fn test_unsuspend() {
        let (db, alice, _) = setup().await;

        suspend(db.pool(), &alice.user_id).await.unwrap();
        set_role(db.pool(), &alice.user_id, Role::Moderator).await.unwrap();

        let account = verify_credentials(db.pool(), PasswordScheme::Sha256, "alice", "pw123")
            .await
            .unwrap();
        assert_eq!(account.role, Role::Moderator);
    }

    #[tokio::test]
    async fn test_set_role_unknown_account() {
        let (db, _, _) = setup().await;
        assert!(matches!(
            set_role(db.pool(), "uid-nobody", Role::Moderator).await,
            Err(LifError::UserNotFound)
        ));
        assert!(matches!(
            suspend_user(db.pool(), "nobody").await,
            Err(LifError::UserNotFound)
        ));
    }

    #[tokio::test]
    async fn test_suspend_user_by_name() {
        let (db, _, _) = setup().await;
        suspend_user(db.pool(), "bob").await.unwrap();
        assert!(matches!(
            verify_credentials(db.pool(), PasswordScheme::Sha256, "bob", "pw").await,
            Err(LifError::AccountSuspended)
        ));
    }

    #[tokio::test]
    async fn test_grant_and_revoke() {
        let (db, alice, _) = setup().await;

        grant_node(db.pool(), &alice.user_id, "account.email").await.unwrap();
        grant_node(db.pool(), &alice.user_id, "account.email").await.unwrap();
        assert_eq!(nodes(&db, &alice.user_id).await, vec!["account.email"]);

        revoke_node(db.pool(), &alice.user_id, "account.email").await.unwrap();
        revoke_node(db.pool(), &alice.user_id, "account.email").await.unwrap();
        assert!(nodes(&db, &alice.user_id).await.is_empty());

        assert!(matches!(
            grant_node(db.pool(), "uid-nobody", "x").await,
            Err(LifError::UserNotFound)
        ));
        assert!(matches!(
            grant_node(db.pool(), &alice.user_id, "has space").await,
            Err(LifError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_reports() {
        let (db, _, _) = setup().await;

        let report = submit_report(
            db.pool(),
            &accepted(),
            &NewReport::new("bob", "Ringer", "spam", "buy now"),
        )
        .await
        .unwrap();
        assert!(!report.resolved);

        assert!(matches!(
            submit_report(db.pool(), &accepted(), &NewReport::new("bob", "Dayly", "r", "c")).await,
            Err(LifError::Validation(_))
        ));
        assert!(matches!(
            submit_report(db.pool(), &accepted(), &NewReport::new("nobody", "Ringer", "r", "c")).await,
            Err(LifError::UserNotFound)
        ));

        assert_eq!(get_report(db.pool(), report.id).await.unwrap().reason, "spam");
        assert!(matches!(
            get_report(db.pool(), 999).await,
            Err(LifError::ReportNotFound)
        ));

        let unresolved = list_reports(db.pool(), Some(ReportFilter::Unresolved)).await.unwrap();
        assert_eq!(unresolved.len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_report_is_idempotent() {
        let (db, _, _) = setup().await;
        let report = submit_report(
            db.pool(),
            &accepted(),
            &NewReport::new("bob", "Support", "abuse", "..."),
        )
        .await
        .unwrap();

        resolve_report(db.pool(), report.id).await.unwrap();
        assert!(get_report(db.pool(), report.id).await.unwrap().resolved);
        resolve_report(db.pool(), report.id).await.unwrap();
        assert!(get_report(db.pool(), report.id).await.unwrap().resolved);

        assert!(list_reports(db.pool(), Some(ReportFilter::Unresolved))
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(
            resolve_report(db.pool(), 999).await,
            Err(LifError::ReportNotFound)
        ));
    }

    #[tokio::test]
    async fn test_manage_privileges_per_account() {
        let (db, alice, bob) = setup().await;
        PermissionRepository::new(db.pool())
            .add(&alice.user_id, "old.node")
            .await
            .unwrap();

        let updates = vec![
            PrivilegeUpdate {
                user_id: alice.user_id.clone(),
                role: Some(Role::Moderator),
                permissions: vec!["a.b".to_string(), "c.d".to_string()],
            },
            PrivilegeUpdate {
                user_id: "uid-nobody".to_string(),
                role: None,
                permissions: vec!["x".to_string()],
            },
            PrivilegeUpdate {
                user_id: bob.user_id.clone(),
                role: None,
                permissions: vec![],
            },
        ];

        let outcome = manage_privileges(db.pool(), &updates, BatchMode::PerAccount)
            .await
            .unwrap();
        assert_eq!(outcome.updated, vec![alice.user_id.clone(), bob.user_id.clone()]);
        assert_eq!(outcome.not_found, vec!["uid-nobody".to_string()]);

        assert_eq!(nodes(&db, &alice.user_id).await, vec!["a.b", "c.d"]);
        let alice = AccountRepository::new(db.pool())
            .get_by_user_id(&alice.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alice.role, Role::Moderator);
        assert_eq!(
            AccountRepository::new(db.pool())
                .get_by_user_id(&bob.user_id)
                .await
                .unwrap()
                .unwrap()
                .role,
            Role::User
        );
    }

    #[tokio::test]
    async fn test_manage_privileges_all_or_nothing() {
        let (db, alice, _) = setup().await;
        PermissionRepository::new(db.pool())
            .add(&alice.user_id, "old.node")
            .await
            .unwrap();

        let updates = vec![
            PrivilegeUpdate {
                user_id: alice.user_id.clone(),
                role: Some(Role::Moderator),
                permissions: vec!["a.b".to_string()],
            },
            PrivilegeUpdate {
                user_id: "uid-nobody".to_string(),
                role: None,
                permissions: vec![],
            },
        ];

        assert!(matches!(
            manage_privileges(db.pool(), &updates, BatchMode::AllOrNothing).await,
            Err(LifError::UserNotFound)
        ));

        assert_eq!(nodes(&db, &alice.user_id).await, vec!["old.node"]);
        let alice = AccountRepository::new(db.pool())
            .get_by_user_id(&alice.user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(alice.role, Role::User);

        let outcome = manage_privileges(db.pool(), &updates[..1], BatchMode::AllOrNothing)
            .await
            .unwrap();
        assert_eq!(outcome.updated.len(), 1);
        assert_eq!(nodes(&db, &alice.user_id).await, vec!["a.b"]);
    }

    #[tokio::test]
    async fn test_manage_privileges_rejects_invalid_node() {
        let (db, alice, _) = setup().await;
        let updates = vec![PrivilegeUpdate {
            user_id: alice.user_id.clone(),
            role: None,
            permissions: vec!["".to_string()],
        }];
        assert!(matches!(
            manage_privileges(db.pool(), &updates, BatchMode::PerAccount).await,
            Err(LifError::Validation(_))
        ));
    }

    #[test]
    fn test_privilege_update_json() {
        let update: PrivilegeUpdate = serde_json::from_str(
            r#"{"userId":"u1","role":"MODERATOR","permissions":["a.b"]}"#,
        )
        .unwrap();
        assert_eq!(update.role, Some(Role::Moderator));

        let update: PrivilegeUpdate = serde_json::from_str(r#"{"userId":"u1"}"#).unwrap();
        assert!(update.role.is_none());
        assert!(update.permissions.is_empty());
    }
}
