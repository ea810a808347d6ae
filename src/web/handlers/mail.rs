//! Broadcast mail handlers.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    Json,
};
use tracing::{error, info};

use crate::auth::require_nodes;
use crate::db::AccountRepository;
use crate::mail::{broadcast, BroadcastReport};
use crate::web::error::ApiError;
use crate::web::extract::HeaderCredentials;
use crate::web::state::AppState;

/// Node a caller needs to mail every account.
pub const SEND_ALL_NODE: &str = "email.send_all";

async fn send_to_everyone(state: &AppState, subject: &str, body: &str) -> Result<BroadcastReport, ApiError> {
    let accounts = AccountRepository::new(state.pool()).list_all().await?;
    if accounts.is_empty() {
        return Err(ApiError::not_found("No accounts to email."));
    }
    Ok(broadcast(state.mailer.as_ref(), &accounts, subject, body).await)
}

/// POST /mail/send_all - Email every account on behalf of a service.
///
/// Headers `subject` and `accessToken`; the request body is the message.
#[utoipa::path(
    post,
    path = "/mail/send_all",
    tag = "mail",
    request_body(content = String, content_type = "text/plain"),
    responses(
        (status = 200, description = "Broadcast sent", body = String),
        (status = 400, description = "Missing headers"),
        (status = 401, description = "Unknown service token"),
        (status = 403, description = "Service lacks email.send_all"),
        (status = 404, description = "No accounts to email")
    )
)]
pub async fn send_all(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<&'static str>, ApiError> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string);
    let (Some(subject), Some(access_token)) = (header("subject"), header("accesstoken")) else {
        return Err(ApiError::bad_request("subject and accessToken headers required."));
    };

    state.access_control.authorize(&access_token, SEND_ALL_NODE)?;

    let report = send_to_everyone(&state, &subject, &body).await?;
    info!(sent = report.sent, failed = report.failed, "service broadcast");
    Ok(Json("Ok"))
}

/// POST /mail/v2/send_all - Email every account on behalf of a user.
///
/// Request body: multipart/form-data with "subject", "textBody" and an
/// optional HTML "file" that replaces the text body.
#[utoipa::path(
    post,
    path = "/mail/v2/send_all",
    tag = "mail",
    responses(
        (status = 200, description = "Broadcast sent", body = String),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Missing email.send_all"),
        (status = 404, description = "No accounts to email")
    )
)]
pub async fn send_all_v2(
    State(state): State<Arc<AppState>>,
    creds: HeaderCredentials,
    mut multipart: Multipart,
) -> Result<Json<&'static str>, ApiError> {
    let account = creds.authenticate(state.pool()).await?;
    require_nodes(state.pool(), &account, &[SEND_ALL_NODE]).await?;

    let mut subject: Option<String> = None;
    let mut text_body: Option<String> = None;
    let mut html_body: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();
        let value = field
            .text()
            .await
            .map_err(|_| ApiError::bad_request(format!("Invalid {} field", name)))?;

        match name.as_str() {
            "subject" => subject = Some(value),
            "textBody" => text_body = Some(value),
            "file" if !value.is_empty() => html_body = Some(value),
            _ => {}
        }
    }

    let Some(subject) = subject else {
        return Err(ApiError::bad_request("subject is required"));
    };
    let Some(body) = html_body.or(text_body) else {
        return Err(ApiError::bad_request("textBody or file is required"));
    };

    let report = send_to_everyone(&state, &subject, &body).await?;
    info!(username = %account.username, sent = report.sent, failed = report.failed, "user broadcast");
    Ok(Json("Ok"))
}
