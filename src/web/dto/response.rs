//! Response DTOs for Web API.
//!
//! Field names match what existing platform clients read, hence the
//! capitalized `Status` keys.

use serde::Serialize;
use utoipa::ToSchema;

/// Session token returned by login.
#[derive(Debug, Serialize, ToSchema)]
pub struct TokenResponse {
    /// Session token.
    pub token: String,
}

/// Generic success marker.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusResponse {
    /// Always `Ok`.
    #[serde(rename = "Status")]
    pub status: &'static str,
}

impl StatusResponse {
    /// The success marker.
    pub fn ok() -> Self {
        Self { status: "Ok" }
    }
}

/// Result of account creation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CreateAccountResponse {
    /// Always `Ok`.
    pub status: &'static str,
    /// Username of the new account.
    pub username: String,
    /// Session token of the new account.
    pub token: String,
}

/// Email of a single account.
#[derive(Debug, Serialize, ToSchema)]
pub struct EmailResponse {
    /// Email address.
    pub email: String,
}

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: &'static str,
    /// Whether the database answered.
    pub database: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_response_serialize() {
        let json = serde_json::to_value(StatusResponse::ok()).unwrap();
        assert_eq!(json, serde_json::json!({"Status": "Ok"}));
    }

    #[test]
    fn test_create_account_response_serialize() {
        let json = serde_json::to_value(CreateAccountResponse {
            status: "Ok",
            username: "alice".to_string(),
            token: "t1".to_string(),
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({"Status": "Ok", "Username": "alice", "Token": "t1"})
        );
    }
}
