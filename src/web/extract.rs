//! Request extractors for user and service credentials.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use sqlx::SqlitePool;

use crate::auth::check_token;
use crate::db::Account;
use crate::web::error::ApiError;

fn header_value(parts: &Parts, name: &str) -> Option<String> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Username and session token taken from the `username` and `token`
/// headers.
#[derive(Debug, Clone)]
pub struct HeaderCredentials {
    pub username: String,
    pub token: String,
}

impl HeaderCredentials {
    /// Check the token and return the account it belongs to.
    pub async fn authenticate(&self, pool: &SqlitePool) -> Result<Account, ApiError> {
        Ok(check_token(pool, &self.username, &self.token).await?)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for HeaderCredentials
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match (header_value(parts, "username"), header_value(parts, "token")) {
            (Some(username), Some(token)) => Ok(Self { username, token }),
            _ => Err(ApiError::bad_request("Username and token required.")),
        }
    }
}

/// Service capability token taken from the `access-token` header.
#[derive(Debug, Clone)]
pub struct ServiceToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ServiceToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        header_value(parts, "access-token")
            .map(ServiceToken)
            .ok_or_else(|| ApiError::bad_request("access token required."))
    }
}
