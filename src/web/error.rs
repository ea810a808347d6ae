//! HTTP error responses.
//!
//! Every failed request answers with
//! `{"error": {"code": "...", "message": "...", "details": {...}}}`, where
//! `details` only appears for rejected form or JSON fields.

use std::collections::HashMap;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::LifError;

/// Machine-readable error code sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    /// Field-level input errors; carries `details`.
    ValidationError,
    TooManyRequests,
    InternalError,
}

impl ErrorCode {
    /// HTTP status sent with this code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorCode::BadRequest | ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

type FieldErrors = HashMap<String, Vec<String>>;

#[derive(Serialize)]
struct Envelope<'a> {
    error: Body<'a>,
}

#[derive(Serialize)]
struct Body<'a> {
    code: ErrorCode,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a FieldErrors>,
}

/// Error returned by handlers and extractors.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<FieldErrors>,
}

impl ApiError {
    fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Conflict, message)
    }

    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::TooManyRequests, message)
    }

    /// Collect validator messages per field. Fields without a custom
    /// message get a generic one.
    pub fn from_validation_errors(errors: validator::ValidationErrors) -> Self {
        let details = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages = errs
                    .iter()
                    .map(|e| match &e.message {
                        Some(m) => m.to_string(),
                        None => format!("Invalid value for {field}"),
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        Self {
            code: ErrorCode::ValidationError,
            message: "Validation failed".to_string(),
            details: Some(details),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let envelope = Envelope {
            error: Body {
                code: self.code,
                message: &self.message,
                details: self.details.as_ref(),
            },
        };
        (self.code.status_code(), Json(envelope)).into_response()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<LifError> for ApiError {
    fn from(err: LifError) -> Self {
        match err {
            LifError::InvalidCredentials => ApiError::unauthorized("Invalid credentials."),
            LifError::InvalidToken => ApiError::unauthorized("Invalid token."),
            LifError::UnknownServiceToken => ApiError::unauthorized("Invalid access token."),
            LifError::AccountSuspended => ApiError::forbidden("Account suspended."),
            LifError::NoPermission(_) => ApiError::forbidden("No Permission"),
            LifError::UserNotFound => ApiError::not_found("User not found"),
            LifError::ReportNotFound => ApiError::not_found("Report not found"),
            LifError::Conflict(msg) => ApiError::conflict(msg),
            LifError::Validation(msg) => ApiError::bad_request(msg),
            _ => {
                tracing::error!(error = %err, "internal error");
                ApiError::new(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(length(min = 3, message = "Too short"))]
        username: String,
        #[validate(email)]
        email: String,
    }

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_from_lif_error() {
        let cases = [
            (LifError::InvalidCredentials, StatusCode::UNAUTHORIZED),
            (LifError::InvalidToken, StatusCode::UNAUTHORIZED),
            (LifError::UnknownServiceToken, StatusCode::UNAUTHORIZED),
            (LifError::AccountSuspended, StatusCode::FORBIDDEN),
            (LifError::NoPermission("a.b".into()), StatusCode::FORBIDDEN),
            (LifError::UserNotFound, StatusCode::NOT_FOUND),
            (LifError::ReportNotFound, StatusCode::NOT_FOUND),
            (LifError::Conflict("dup".into()), StatusCode::CONFLICT),
            (LifError::Validation("bad".into()), StatusCode::BAD_REQUEST),
            (LifError::Database("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (LifError::Mail("down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(ApiError::from(err).code().status_code(), status);
        }
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (status, body) = body_json(LifError::Database("secret path".into()).into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["code"], "INTERNAL_ERROR");
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_validation_details() {
        let signup = Signup {
            username: "al".to_string(),
            email: "nope".to_string(),
        };
        let err = ApiError::from_validation_errors(signup.validate().unwrap_err());

        let (status, body) = body_json(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(body["error"]["details"]["username"][0], "Too short");
        assert_eq!(body["error"]["details"]["email"][0], "Invalid value for email");
    }
}
