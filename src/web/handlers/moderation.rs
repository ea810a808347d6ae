//! Moderation handlers.
//!
//! Every endpoint takes the moderator's `username` and `token` headers.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Form, Json,
};
use tracing::info;

use crate::auth::{require_nodes, require_role, search_users as find_users, UserSearchResult};
use crate::db::{Account, Report, ReportFilter, Role};
use crate::moderation::{self, PrivilegeOutcome, PrivilegeUpdate};
use crate::web::dto::{ReportsQuery, ResolveReportForm, SearchUsersQuery, SuspendUserForm};
use crate::web::error::ApiError;
use crate::web::extract::HeaderCredentials;
use crate::web::state::AppState;

async fn require_moderator(state: &AppState, creds: &HeaderCredentials) -> Result<Account, ApiError> {
    let account = creds.authenticate(state.pool()).await?;
    require_role(&account, Role::Moderator)?;
    Ok(account)
}

async fn require_node(
    state: &AppState,
    creds: &HeaderCredentials,
    node: &str,
) -> Result<Account, ApiError> {
    let account = creds.authenticate(state.pool()).await?;
    require_nodes(state.pool(), &account, &[node]).await?;
    Ok(account)
}

/// POST /moderation/suspend_account - Suspend an account by username.
#[utoipa::path(
    post,
    path = "/moderation/suspend_account",
    tag = "moderation",
    request_body(content = SuspendUserForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Account suspended", body = String),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Not a moderator"),
        (status = 404, description = "User not found")
    )
)]
pub async fn suspend_account(
    State(state): State<Arc<AppState>>,
    creds: HeaderCredentials,
    Form(form): Form<SuspendUserForm>,
) -> Result<Json<&'static str>, ApiError> {
    let moderator = require_moderator(&state, &creds).await?;
    moderation::suspend_user(state.pool(), &form.user).await?;
    info!(moderator = %moderator.username, user = %form.user, "account suspended by moderator");
    Ok(Json("Ok"))
}

/// GET /moderation/reports - List reports.
#[utoipa::path(
    get,
    path = "/moderation/reports",
    tag = "moderation",
    params(ReportsQuery),
    responses(
        (status = 200, description = "Reports", body = Vec<Report>),
        (status = 400, description = "Unknown filter"),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Not a moderator")
    )
)]
pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    creds: HeaderCredentials,
    Query(query): Query<ReportsQuery>,
) -> Result<Json<Vec<Report>>, ApiError> {
    require_moderator(&state, &creds).await?;

    let filter = match query.search_filter.as_deref() {
        None => None,
        Some(value) => Some(
            ReportFilter::parse(value).ok_or_else(|| ApiError::bad_request("Invalid search filter"))?,
        ),
    };

    Ok(Json(moderation::list_reports(state.pool(), filter).await?))
}

/// GET /moderation/reports/{id} - Get one report.
#[utoipa::path(
    get,
    path = "/moderation/reports/{id}",
    tag = "moderation",
    params(("id" = i64, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report", body = Report),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Not a moderator"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn get_report(
    State(state): State<Arc<AppState>>,
    creds: HeaderCredentials,
    Path(id): Path<i64>,
) -> Result<Json<Report>, ApiError> {
    require_moderator(&state, &creds).await?;
    Ok(Json(moderation::get_report(state.pool(), id).await?))
}

/// POST /moderation/reports/resolve - Mark a report resolved.
#[utoipa::path(
    post,
    path = "/moderation/reports/resolve",
    tag = "moderation",
    request_body(content = ResolveReportForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Report resolved", body = String),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Not a moderator"),
        (status = 404, description = "Report not found")
    )
)]
pub async fn resolve_report(
    State(state): State<Arc<AppState>>,
    creds: HeaderCredentials,
    Form(form): Form<ResolveReportForm>,
) -> Result<Json<&'static str>, ApiError> {
    require_moderator(&state, &creds).await?;
    moderation::resolve_report(state.pool(), form.report_id).await?;
    Ok(Json("Ok"))
}

/// GET /moderation/search_users - Search accounts by username prefix.
#[utoipa::path(
    get,
    path = "/moderation/search_users",
    tag = "moderation",
    params(SearchUsersQuery),
    responses(
        (status = 200, description = "Matching accounts", body = Vec<UserSearchResult>),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Missing moderation.search_users")
    )
)]
pub async fn search_users(
    State(state): State<Arc<AppState>>,
    creds: HeaderCredentials,
    Query(query): Query<SearchUsersQuery>,
) -> Result<Json<Vec<UserSearchResult>>, ApiError> {
    require_node(&state, &creds, "moderation.search_users").await?;
    Ok(Json(find_users(state.pool(), &query.query).await?))
}

/// POST /moderation/manage_privileges - Replace roles and permission sets.
#[utoipa::path(
    post,
    path = "/moderation/manage_privileges",
    tag = "moderation",
    request_body = Vec<PrivilegeUpdate>,
    responses(
        (status = 200, description = "Batch applied", body = PrivilegeOutcome),
        (status = 400, description = "Invalid permission node"),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Missing moderation.manage_privileges"),
        (status = 404, description = "Unknown account in all-or-nothing mode")
    )
)]
pub async fn manage_privileges(
    State(state): State<Arc<AppState>>,
    creds: HeaderCredentials,
    Json(updates): Json<Vec<PrivilegeUpdate>>,
) -> Result<Json<PrivilegeOutcome>, ApiError> {
    let moderator = require_node(&state, &creds, "moderation.manage_privileges").await?;
    let outcome =
        moderation::manage_privileges(state.pool(), &updates, state.config.moderation.batch_mode)
            .await?;
    info!(moderator = %moderator.username, updated = outcome.updated.len(), "privileges managed");
    Ok(Json(outcome))
}
