//! OpenAPI document for the Lif Auth Server.

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use super::dto;
use super::handlers;
use crate::auth::{UserInfo, UserSearchResult};
use crate::db::{Report, Role};
use crate::moderation::{PrivilegeOutcome, PrivilegeUpdate};

#[derive(OpenApi)]
#[openapi(
    info(title = "Lif Auth Server", description = "Accounts, sessions and permissions for the Lif platform"),
    paths(
        handlers::root,
        handlers::health,
        handlers::auth::login,
        handlers::auth::verify_token_form,
        handlers::auth::verify_token_cookie,
        handlers::auth::logout,
        handlers::auth::service_suspend_account,
        handlers::auth::add_permission,
        handlers::auth::remove_permission,
        handlers::account::reset_token,
        handlers::account::update_avatar,
        handlers::account::update_banner,
        handlers::account::update_personalization,
        handlers::account::get_info,
        handlers::account::create_account,
        handlers::account::check_info_usage,
        handlers::account::update_email,
        handlers::account::get_username,
        handlers::account::get_id,
        handlers::account::two_factor_setup,
        handlers::account::update_password,
        handlers::account::report,
        handlers::recovery::account_recovery,
        handlers::profile::get_bio,
        handlers::profile::get_pronouns,
        handlers::profile::get_avatar,
        handlers::profile::get_banner,
        handlers::profile::get_profile,
        handlers::moderation::suspend_account,
        handlers::moderation::list_reports,
        handlers::moderation::get_report,
        handlers::moderation::resolve_report,
        handlers::moderation::search_users,
        handlers::moderation::manage_privileges,
        handlers::mail::send_all,
        handlers::mail::send_all_v2,
    ),
    components(
        schemas(
            dto::LoginForm,
            dto::TokenForm,
            dto::ServiceSuspendForm,
            dto::UpdatePermissionsRequest,
            dto::CreateAccountRequest,
            dto::PersonalizationForm,
            dto::UpdateEmailForm,
            dto::UpdatePasswordForm,
            dto::ReportForm,
            dto::SuspendUserForm,
            dto::ResolveReportForm,
            dto::TokenResponse,
            dto::StatusResponse,
            dto::CreateAccountResponse,
            dto::EmailResponse,
            dto::HealthResponse,
            Report,
            Role,
            UserInfo,
            UserSearchResult,
            PrivilegeUpdate,
            PrivilegeOutcome,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Login, token checks and service-side account control"),
        (name = "account", description = "Account management"),
        (name = "profile", description = "Public profile data"),
        (name = "moderation", description = "Moderator tools"),
        (name = "mail", description = "Broadcast email"),
        (name = "misc", description = "Service health"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "service_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("access-token"))),
            );
            components.add_security_scheme(
                "user_token",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("token"))),
            );
        }
    }
}
