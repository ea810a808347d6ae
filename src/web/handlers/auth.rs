//! Authentication handlers.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::{info, warn};
use url::Url;

use crate::auth::{check_token, parse_nodes, require_nodes, require_role, verify_credentials};
use crate::db::{Account, Role};
use crate::moderation;
use crate::web::dto::{
    LoginForm, LogoutQuery, PermissionsQuery, ServiceSuspendForm, TokenForm, TokenResponse,
    UpdatePermissionsRequest, ValidatedJson, VerifyTokenQuery,
};
use crate::web::error::ApiError;
use crate::web::state::AppState;

/// Cookie holding the username of a browser session.
pub const USERNAME_COOKIE: &str = "LIF_USERNAME";

/// Cookie holding the session token of a browser session.
pub const TOKEN_COOKIE: &str = "LIF_TOKEN";

/// POST /auth/login - Exchange credentials for the session token.
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    params(PermissionsQuery),
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Session token", body = TokenResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account suspended or missing permissions"),
        (status = 429, description = "Too many login attempts")
    )
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PermissionsQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    let account = verify_credentials(state.pool(), state.scheme(), &form.username, &form.password).await?;

    if let Some(csv) = query.permissions.as_deref() {
        require_nodes(state.pool(), &account, &parse_nodes(csv)).await?;
    }

    info!(username = %account.username, "login succeeded");
    Ok(Json(TokenResponse { token: account.token }))
}

async fn verify(
    state: &AppState,
    username: Option<String>,
    token: Option<String>,
    query: &VerifyTokenQuery,
) -> Result<Json<&'static str>, ApiError> {
    let (Some(username), Some(token)) = (username, token) else {
        return Err(ApiError::bad_request("Username and token required."));
    };

    let account = check_token(state.pool(), &username, &token).await?;
    check_requirements(state, &account, query).await?;

    Ok(Json("Token is valid!"))
}

async fn check_requirements(
    state: &AppState,
    account: &Account,
    query: &VerifyTokenQuery,
) -> Result<(), ApiError> {
    if let Some(csv) = query.permissions.as_deref() {
        require_nodes(state.pool(), account, &parse_nodes(csv)).await?;
    }

    if let Some(role) = query.role.as_deref() {
        let role: Role = role.parse().map_err(|_| ApiError::forbidden("No Permission"))?;
        require_role(account, role)?;
    }

    Ok(())
}

/// POST /auth/verify_token - Check a token sent as form fields.
#[utoipa::path(
    post,
    path = "/auth/verify_token",
    tag = "auth",
    params(VerifyTokenQuery),
    request_body(content = TokenForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Token is valid", body = String),
        (status = 400, description = "Username or token missing"),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Suspended, wrong role or missing permissions")
    )
)]
pub async fn verify_token_form(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyTokenQuery>,
    Form(form): Form<TokenForm>,
) -> Result<Json<&'static str>, ApiError> {
    verify(&state, form.username, form.token, &query).await
}

/// GET /auth/verify_token - Check the token held in the session cookies.
#[utoipa::path(
    get,
    path = "/auth/verify_token",
    tag = "auth",
    params(VerifyTokenQuery),
    responses(
        (status = 200, description = "Token is valid", body = String),
        (status = 400, description = "Cookies missing"),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Suspended, wrong role or missing permissions")
    )
)]
pub async fn verify_token_cookie(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyTokenQuery>,
    jar: CookieJar,
) -> Result<Json<&'static str>, ApiError> {
    let username = jar.get(USERNAME_COOKIE).map(|c| c.value().to_string());
    let token = jar.get(TOKEN_COOKIE).map(|c| c.value().to_string());
    verify(&state, username, token, &query).await
}

/// Whether `url` points at the trusted domain or one of its subdomains.
pub fn is_trusted_redirect(url: &str, trusted_domain: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let trusted = trusted_domain.trim_start_matches('.').to_ascii_lowercase();
    !trusted.is_empty() && (host == trusted || host.ends_with(&format!(".{trusted}")))
}

/// An expired cookie that makes the browser drop `name`, whether or not
/// the request carried it.
fn removal_cookie(name: &'static str, trusted_domain: &str) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, "")).path("/").build();
    if !trusted_domain.is_empty() {
        cookie.set_domain(format!(".{}", trusted_domain.trim_start_matches('.')));
    }
    cookie.make_removal();
    cookie
}

/// GET /auth/logout - Clear the session cookies.
#[utoipa::path(
    get,
    path = "/auth/logout",
    tag = "auth",
    params(LogoutQuery),
    responses(
        (status = 200, description = "Logged out", body = String),
        (status = 303, description = "Logged out and redirected"),
        (status = 400, description = "Untrusted redirect url")
    )
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LogoutQuery>,
    jar: CookieJar,
) -> Result<Response, ApiError> {
    let trusted_domain = &state.config.web.trusted_domain;

    if let Some(redirect) = query.redirect.as_deref() {
        if !is_trusted_redirect(redirect, trusted_domain) {
            warn!(redirect = %redirect, "rejected logout redirect");
            return Err(ApiError::bad_request("Untrusted redirect url."));
        }
    }

    let jar = jar
        .add(removal_cookie(USERNAME_COOKIE, trusted_domain))
        .add(removal_cookie(TOKEN_COOKIE, trusted_domain));

    Ok(match query.redirect {
        Some(redirect) => (jar, Redirect::to(&redirect)).into_response(),
        None => (jar, Json("Log Out Successful")).into_response(),
    })
}

/// POST /auth/suspend_account - Suspend an account on behalf of a service.
#[utoipa::path(
    post,
    path = "/auth/suspend_account",
    tag = "auth",
    request_body(content = ServiceSuspendForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Account suspended", body = String),
        (status = 401, description = "Unknown service token"),
        (status = 403, description = "Service lacks account.suspend"),
        (status = 404, description = "User not found")
    )
)]
pub async fn service_suspend_account(
    State(state): State<Arc<AppState>>,
    Form(form): Form<ServiceSuspendForm>,
) -> Result<Json<&'static str>, ApiError> {
    state.access_control.authorize(&form.access_token, "account.suspend")?;
    moderation::suspend(state.pool(), &form.account_id).await?;
    Ok(Json("ok"))
}

/// POST /auth/update_permissions - Grant a permission node.
#[utoipa::path(
    post,
    path = "/auth/update_permissions",
    tag = "auth",
    request_body = UpdatePermissionsRequest,
    responses(
        (status = 200, description = "Permission added", body = String),
        (status = 401, description = "Unknown service token"),
        (status = 403, description = "Service lacks account.permissions"),
        (status = 404, description = "User not found")
    )
)]
pub async fn add_permission(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<UpdatePermissionsRequest>,
) -> Result<Json<&'static str>, ApiError> {
    state.access_control.authorize(&req.access_token, "account.permissions")?;
    moderation::grant_node(state.pool(), &req.account_id, &req.permission_node).await?;
    Ok(Json("Permission Added"))
}

/// DELETE /auth/update_permissions - Revoke a permission node.
#[utoipa::path(
    delete,
    path = "/auth/update_permissions",
    tag = "auth",
    request_body = UpdatePermissionsRequest,
    responses(
        (status = 200, description = "Permission removed", body = String),
        (status = 401, description = "Unknown service token"),
        (status = 403, description = "Service lacks account.permissions"),
        (status = 404, description = "User not found")
    )
)]
pub async fn remove_permission(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<UpdatePermissionsRequest>,
) -> Result<Json<&'static str>, ApiError> {
    state.access_control.authorize(&req.access_token, "account.permissions")?;
    moderation::revoke_node(state.pool(), &req.account_id, &req.permission_node).await?;
    Ok(Json("Permission Removed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_trusted_redirect() {
        assert!(is_trusted_redirect("https://lifplatforms.com/home", "lifplatforms.com"));
        assert!(is_trusted_redirect("https://my.lifplatforms.com", "lifplatforms.com"));
        assert!(!is_trusted_redirect("https://evil.com", "lifplatforms.com"));
        assert!(!is_trusted_redirect("https://lifplatforms.com.evil.com", "lifplatforms.com"));
        assert!(!is_trusted_redirect("https://notlifplatforms.com", "lifplatforms.com"));
        assert!(!is_trusted_redirect("not a url", "lifplatforms.com"));
        assert!(!is_trusted_redirect("https://lifplatforms.com", ""));
    }

    #[test]
    fn test_removal_cookie_domain() {
        let cookie = removal_cookie(TOKEN_COOKIE, "lifplatforms.com");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.domain(), Some("lifplatforms.com"));
        assert_eq!(cookie.value(), "");
    }
}
