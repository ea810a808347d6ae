//! Request DTOs for Web API.

use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::validation::{no_control_chars, not_empty_trimmed};

/// Login form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginForm {
    /// Username.
    pub username: String,
    /// Password.
    pub password: String,
}

/// Required permission nodes, as a comma separated list.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PermissionsQuery {
    /// Comma separated permission nodes that must all be held.
    pub permissions: Option<String>,
}

/// Query of the token verification endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VerifyTokenQuery {
    /// Comma separated permission nodes that must all be held.
    pub permissions: Option<String>,
    /// Role the account must have.
    pub role: Option<String>,
}

/// Username and token sent as form fields.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct TokenForm {
    /// Username.
    pub username: Option<String>,
    /// Session token.
    pub token: Option<String>,
}

/// Query of the logout endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LogoutQuery {
    /// URL to redirect to after logout.
    pub redirect: Option<String>,
}

/// Service request to suspend an account.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ServiceSuspendForm {
    /// Target account id.
    pub account_id: String,
    /// Service access token.
    pub access_token: String,
}

/// Service request to grant or revoke a permission node.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePermissionsRequest {
    /// Target account id.
    pub account_id: String,
    /// Permission node.
    #[validate(length(min = 1, max = 128, message = "Permission node must be 1-128 characters"))]
    pub permission_node: String,
    /// Service access token.
    pub access_token: String,
}

/// Account creation request.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAccountRequest {
    /// Username.
    #[validate(length(min = 1, max = 32, message = "Username must be 1-32 characters"))]
    pub username: String,
    /// Password.
    #[validate(length(min = 1, max = 128, message = "Password must be 1-128 characters"))]
    pub password: String,
    /// Email address.
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    /// Pronouns (optional).
    #[serde(default)]
    #[validate(length(max = 50, message = "Pronouns must be at most 50 characters"))]
    pub pronouns: Option<String>,
}

/// Bio and pronouns update.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PersonalizationForm {
    /// Username.
    pub username: String,
    /// Session token.
    pub token: String,
    /// New bio.
    pub bio: String,
    /// New pronouns.
    pub pronouns: String,
}

/// Query of the account info endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct GetInfoQuery {
    /// `username` or `userID`; how the `accounts` header is interpreted.
    pub search_mode: Option<String>,
}

/// Query of the profile page.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProfilePageQuery {
    /// Base URL the page loads avatar and banner images from.
    pub service_url: Option<String>,
}

/// Email change form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEmailForm {
    /// Username.
    pub username: String,
    /// Current password.
    pub password: String,
    /// New email address.
    pub email: String,
}

/// Password change form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePasswordForm {
    /// Username.
    pub username: String,
    /// Current password.
    pub current_password: String,
    /// New password.
    pub new_password: String,
}

/// User report form.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ReportForm {
    /// Username of the reported account.
    pub user: String,
    /// Service the incident happened on.
    pub service: String,
    /// Reason for the report.
    #[validate(
        length(max = 500, message = "Reason must be at most 500 characters"),
        custom(function = "not_empty_trimmed"),
        custom(function = "no_control_chars")
    )]
    pub reason: String,
    /// Reported content.
    #[validate(length(max = 10000, message = "Content must be at most 10000 characters"))]
    pub content: String,
}

/// Moderator request to suspend an account.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SuspendUserForm {
    /// Username of the account to suspend.
    pub user: String,
}

/// Query of the report listing endpoint.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportsQuery {
    /// `resolved` or `unresolved`; all reports when absent.
    pub search_filter: Option<String>,
}

/// Report resolution form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResolveReportForm {
    /// Report id.
    pub report_id: i64,
}

/// Query of the user search endpoint.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchUsersQuery {
    /// Username prefix.
    pub query: String,
}
