//! Validating extractors and text checks shared by the request DTOs.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Form, Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::web::error::ApiError;

fn checked<T: Validate>(value: T) -> Result<T, ApiError> {
    value.validate().map_err(ApiError::from_validation_errors)?;
    Ok(value)
}

/// JSON body that has passed its `Validate` rules.
///
/// A body that does not parse is a plain 400; rule failures list the
/// offending fields in `details`.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid JSON: {e}")))?;
        checked(value).map(ValidatedJson)
    }
}

/// Url-encoded form that has passed its `Validate` rules.
pub struct ValidatedForm<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedForm<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid form: {e}")))?;
        checked(value).map(ValidatedForm)
    }
}

// Line breaks and tabs are the only control characters kept in free text.
fn is_kept(c: char) -> bool {
    !c.is_control() || matches!(c, '\n' | '\r' | '\t')
}

/// Reject text carrying control characters other than line breaks and tabs.
pub fn no_control_chars(value: &str) -> Result<(), ValidationError> {
    if value.chars().all(is_kept) {
        Ok(())
    } else {
        Err(ValidationError::new("no_control_chars")
            .with_message("Must not contain control characters".into()))
    }
}

/// Reject text that is blank once trimmed.
pub fn not_empty_trimmed(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("not_empty_trimmed").with_message("Must not be empty".into()))
    } else {
        Ok(())
    }
}

/// Drop control characters other than line breaks and tabs.
pub fn sanitize_string(s: &str) -> String {
    s.chars().filter(|c| is_kept(*c)).collect()
}
