//! API handlers for the Lif Auth Server.

pub mod account;
pub mod auth;
pub mod mail;
pub mod moderation;
pub mod profile;
pub mod recovery;

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use crate::web::dto::HealthResponse;
use crate::web::state::AppState;

/// GET / - Welcome text.
#[utoipa::path(
    get,
    path = "/",
    tag = "misc",
    responses((status = 200, description = "Welcome text", body = String))
)]
pub async fn root() -> Json<&'static str> {
    Json("Welcome to the Lif Auth Server!")
}

/// GET /health - Liveness and database check.
#[utoipa::path(
    get,
    path = "/health",
    tag = "misc",
    responses(
        (status = 200, description = "Healthy", body = HealthResponse),
        (status = 503, description = "Database unavailable", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    match state.db.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok",
                database: true,
            }),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "degraded",
                    database: false,
                }),
            )
        }
    }
}
