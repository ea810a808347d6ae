//! User report repository.

use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::Result;

/// Default number of reports returned by a listing.
pub const DEFAULT_REPORT_LIMIT: i64 = 100;

/// A report filed against an account.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct Report {
    /// Report ID.
    pub id: i64,
    /// Username of the reported account.
    pub user: String,
    /// Service the incident happened on.
    pub service: String,
    /// Reason given by the reporter.
    pub reason: String,
    /// Reported content.
    pub content: String,
    /// Whether a moderator resolved the report.
    pub resolved: bool,
    /// Creation timestamp.
    #[serde(skip)]
    pub created_at: String,
}

/// Data for filing a report.
#[derive(Debug, Clone)]
pub struct NewReport {
    /// Username of the reported account.
    pub user: String,
    /// Service the incident happened on.
    pub service: String,
    /// Reason given by the reporter.
    pub reason: String,
    /// Reported content.
    pub content: String,
}

impl NewReport {
    /// Create a new report.
    pub fn new(
        user: impl Into<String>,
        service: impl Into<String>,
        reason: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            service: service.into(),
            reason: reason.into(),
            content: content.into(),
        }
    }
}

/// Resolution filter for report listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFilter {
    /// Only resolved reports.
    Resolved,
    /// Only unresolved reports.
    Unresolved,
}

impl ReportFilter {
    /// Parse a filter from a query string value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "resolved" => Some(ReportFilter::Resolved),
            "unresolved" => Some(ReportFilter::Unresolved),
            _ => None,
        }
    }
}

/// Repository for report operations.
pub struct ReportRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ReportRepository<'a> {
    /// Create a new repository instance.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// File a new report. It starts unresolved.
    pub async fn create(&self, report: &NewReport) -> Result<Report> {
        let row = sqlx::query_as::<_, Report>(
            "INSERT INTO reports (user, service, reason, content, resolved)
             VALUES (?, ?, ?, ?, 0)
             RETURNING id, user, service, reason, content, resolved, created_at",
        )
        .bind(&report.user)
        .bind(&report.service)
        .bind(&report.reason)
        .bind(&report.content)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Get a report by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Report>> {
        let report = sqlx::query_as::<_, Report>(
            "SELECT id, user, service, reason, content, resolved, created_at
             FROM reports WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(report)
    }

    /// List reports, optionally filtered by resolution.
    pub async fn list(&self, filter: Option<ReportFilter>, limit: i64) -> Result<Vec<Report>> {
        let reports = match filter {
            Some(filter) => {
                sqlx::query_as::<_, Report>(
                    "SELECT id, user, service, reason, content, resolved, created_at
                     FROM reports WHERE resolved = ? ORDER BY id LIMIT ?",
                )
                .bind(filter == ReportFilter::Resolved)
                .bind(limit)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Report>(
                    "SELECT id, user, service, reason, content, resolved, created_at
                     FROM reports ORDER BY id LIMIT ?",
                )
                .bind(limit)
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(reports)
    }

    /// Mark a report resolved.
    ///
    /// Returns false only when the report does not exist. Resolving an
    /// already resolved report matches the row again and returns true.
    pub async fn resolve(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE reports SET resolved = 1 WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    #[tokio::test]
    async fn test_create_and_get() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ReportRepository::new(db.pool());

        let report = repo
            .create(&NewReport::new("alice", "Ringer", "spam", "buy now"))
            .await
            .unwrap();

        assert_eq!(report.id, 1);
        assert_eq!(report.user, "alice");
        assert!(!report.resolved);

        let fetched = repo.get_by_id(1).await.unwrap().unwrap();
        assert_eq!(fetched.service, "Ringer");
        assert!(repo.get_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ReportRepository::new(db.pool());
        repo.create(&NewReport::new("alice", "Dayly", "abuse", "..."))
            .await
            .unwrap();

        assert!(repo.resolve(1).await.unwrap());
        assert!(repo.get_by_id(1).await.unwrap().unwrap().resolved);
        assert!(repo.resolve(1).await.unwrap());
        assert!(repo.get_by_id(1).await.unwrap().unwrap().resolved);
        assert!(!repo.resolve(42).await.unwrap());
    }

    #[tokio::test]
    async fn test_list_with_filter() {
        let db = Database::open_in_memory().await.unwrap();
        let repo = ReportRepository::new(db.pool());
        for i in 0..3 {
            repo.create(&NewReport::new(format!("user{i}"), "Support", "r", "c"))
                .await
                .unwrap();
        }
        repo.resolve(2).await.unwrap();

        assert_eq!(repo.list(None, DEFAULT_REPORT_LIMIT).await.unwrap().len(), 3);

        let resolved = repo.list(Some(ReportFilter::Resolved), 100).await.unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, 2);

        let open = repo.list(Some(ReportFilter::Unresolved), 100).await.unwrap();
        assert_eq!(open.len(), 2);

        assert_eq!(repo.list(None, 1).await.unwrap().len(), 1);
    }

    #[test]
    fn test_filter_parse() {
        assert_eq!(ReportFilter::parse("resolved"), Some(ReportFilter::Resolved));
        assert_eq!(ReportFilter::parse("unresolved"), Some(ReportFilter::Unresolved));
        assert_eq!(ReportFilter::parse("all"), None);
    }
}
