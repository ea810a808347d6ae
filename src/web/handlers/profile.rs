//! Public profile handlers.

use std::sync::Arc;

use askama::Template;
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};

use crate::auth::{get_bio as lookup_bio, get_pronouns as lookup_pronouns};
use crate::db::{AccountRepository, DEFAULT_PRONOUNS};
use crate::profile::ImageKind;
use crate::web::dto::ProfilePageQuery;
use crate::web::error::ApiError;
use crate::web::state::AppState;
use crate::LifError;

/// Name shown on the profile page of an unknown account.
const GUEST_NAME: &str = "Guest";

#[derive(Template)]
#[template(path = "profile.html")]
struct ProfilePage<'a> {
    username: &'a str,
    bio: &'a str,
    service_url: &'a str,
}

/// GET /profile/get_bio/{username} - Bio of an account.
#[utoipa::path(
    get,
    path = "/profile/get_bio/{username}",
    tag = "profile",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Bio, empty when unset", body = String),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_bio(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<String>, ApiError> {
    let bio = lookup_bio(state.pool(), &username).await?;
    Ok(Json(bio.unwrap_or_default()))
}

/// GET /profile/get_pronouns/{username} - Pronouns of an account.
#[utoipa::path(
    get,
    path = "/profile/get_pronouns/{username}",
    tag = "profile",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Pronouns", body = String),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_pronouns(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<String>, ApiError> {
    let pronouns = lookup_pronouns(state.pool(), &username).await?;
    Ok(Json(pronouns.unwrap_or_else(|| DEFAULT_PRONOUNS.to_string())))
}

async fn serve_image(state: &AppState, kind: ImageKind, username: &str) -> Result<Response, ApiError> {
    let Some(content) = state.images.load(kind, username).await? else {
        return Err(ApiError::not_found("Image not found"));
    };

    Ok((
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, "public, max-age=3600"),
        ],
        content,
    )
        .into_response())
}

/// GET /profile/get_avatar/{username} - Avatar image.
#[utoipa::path(
    get,
    path = "/profile/get_avatar/{username}",
    tag = "profile",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "PNG image", content_type = "image/png"),
        (status = 404, description = "No avatar uploaded")
    )
)]
pub async fn get_avatar(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Response, ApiError> {
    serve_image(&state, ImageKind::Avatar, &username).await
}

/// GET /profile/get_banner/{username} - Banner image.
#[utoipa::path(
    get,
    path = "/profile/get_banner/{username}",
    tag = "profile",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "PNG image", content_type = "image/png"),
        (status = 404, description = "No banner uploaded")
    )
)]
pub async fn get_banner(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Response, ApiError> {
    serve_image(&state, ImageKind::Banner, &username).await
}

/// GET /profile/get_profile/{username} - Public profile page.
///
/// Unknown usernames render a guest page rather than an error.
#[utoipa::path(
    get,
    path = "/profile/get_profile/{username}",
    tag = "profile",
    params(("username" = String, Path, description = "Username"), ProfilePageQuery),
    responses(
        (status = 200, description = "HTML profile page", content_type = "text/html")
    )
)]
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
    Query(query): Query<ProfilePageQuery>,
) -> Result<Html<String>, ApiError> {
    let account = AccountRepository::new(state.pool())
        .get_by_username(&username)
        .await?;

    let page = match &account {
        Some(account) => ProfilePage {
            username: &account.username,
            bio: account.bio.as_deref().unwrap_or_default(),
            service_url: query.service_url.as_deref().unwrap_or_default(),
        },
        None => ProfilePage {
            username: GUEST_NAME,
            bio: "",
            service_url: query.service_url.as_deref().unwrap_or_default(),
        },
    };

    let html = page
        .render()
        .map_err(|e| LifError::Internal(format!("failed to render profile page: {e}")))?;
    Ok(Html(html))
}
