//! Router configuration for Web API.

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use super::handlers::{account, auth, health, mail, moderation, profile, recovery, root};
use super::middleware::{create_cors_layer, login_rate_limit, LoginRateLimiter};
use super::openapi::ApiDoc;
use super::state::AppState;

/// Largest accepted upload, in bytes.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the main API router.
pub fn create_router(app_state: Arc<AppState>, login_limiter: Arc<LoginRateLimiter>) -> Router {
    // Most endpoints are also served under a `/v1/` path for older clients.
    let login = post(auth::login).route_layer(middleware::from_fn_with_state(
        login_limiter,
        login_rate_limit,
    ));
    let verify_token = get(auth::verify_token_cookie).post(auth::verify_token_form);

    let auth_routes = Router::new()
        .route("/login", login.clone())
        .route("/v1/login", login)
        .route("/verify_token", verify_token.clone())
        .route("/v1/verify_token", verify_token)
        .route("/logout", get(auth::logout))
        .route("/v1/logout", get(auth::logout))
        .route("/suspend_account", post(auth::service_suspend_account))
        .route("/v1/suspend_account", post(auth::service_suspend_account))
        .route(
            "/update_permissions",
            post(auth::add_permission).delete(auth::remove_permission),
        );

    let account_routes = Router::new()
        .route("/reset_token", get(account::reset_token))
        .route("/v1/reset_token", get(account::reset_token))
        .route("/update_avatar", post(account::update_avatar))
        .route("/v1/update_avatar", post(account::update_avatar))
        .route("/update_profile_banner", post(account::update_banner))
        .route("/v1/update_profile_banner", post(account::update_banner))
        .route(
            "/update_info/personalization",
            post(account::update_personalization),
        )
        .route(
            "/v1/update_info/personalization",
            post(account::update_personalization),
        )
        .route("/get_info/:data/:account", get(account::get_info))
        .route("/v1/get_info/:data/:account", get(account::get_info))
        .route("/create_account", post(account::create_account))
        .route("/v1/create", post(account::create_account))
        .route("/check_info_usage/:type/:info", get(account::check_info_usage))
        .route("/v1/check_info_usage/:type/:info", get(account::check_info_usage))
        .route("/account_recovery", get(recovery::account_recovery))
        .route("/v1/recovery", get(recovery::account_recovery))
        .route("/update_email", post(account::update_email))
        .route("/v1/update_email", post(account::update_email))
        .route("/get_username/:account_id", get(account::get_username))
        .route("/v1/get_username/:account_id", get(account::get_username))
        .route("/update_password", post(account::update_password))
        .route("/v1/update_password", post(account::update_password))
        .route("/report", post(account::report))
        .route("/v1/report", post(account::report))
        .route("/get_id/:username", get(account::get_id))
        .route("/v1/get_id/:username", get(account::get_id))
        .route("/v1/2fa-setup", get(account::two_factor_setup))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let profile_routes = Router::new()
        .route("/get_bio/:username", get(profile::get_bio))
        .route("/v1/get_bio/:username", get(profile::get_bio))
        .route("/get_pronouns/:username", get(profile::get_pronouns))
        .route("/v1/get_pronouns/:username", get(profile::get_pronouns))
        .route("/get_avatar/:username", get(profile::get_avatar))
        .route("/v1/get_avatar/:username", get(profile::get_avatar))
        .route("/get_banner/:username", get(profile::get_banner))
        .route("/v1/get_banner/:username", get(profile::get_banner))
        .route("/get_profile/:username", get(profile::get_profile))
        .route("/v1/get_profile/:username", get(profile::get_profile));

    let moderation_routes = Router::new()
        .route("/suspend_account", post(moderation::suspend_account))
        .route("/v1/suspend-account", post(moderation::suspend_account))
        .route("/reports", get(moderation::list_reports))
        .route("/reports/get_reports", get(moderation::list_reports))
        .route("/reports/v1/get", get(moderation::list_reports))
        .route("/reports/resolve", post(moderation::resolve_report))
        .route("/reports/v1/resolve", post(moderation::resolve_report))
        .route("/reports/:id", get(moderation::get_report))
        .route("/reports/get_report/:id", get(moderation::get_report))
        .route("/reports/v1/get/:id", get(moderation::get_report))
        .route("/search_users", get(moderation::search_users))
        .route("/manage_privileges", post(moderation::manage_privileges));

    let mail_routes = Router::new()
        .route("/send_all", post(mail::send_all))
        .route("/v1/send_all", post(mail::send_all))
        .route("/v2/send_all", post(mail::send_all_v2))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES));

    let cors = create_cors_layer(&app_state.config.web.cors_origins);
    let api_docs = app_state.config.web.api_docs;

    let mut router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .nest("/auth", auth_routes)
        .nest("/account", account_routes)
        .nest("/profile", profile_routes)
        .nest("/moderation", moderation_routes)
        .nest("/mail", mail_routes)
        .with_state(app_state);

    if api_docs {
        router = router.merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()));
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}
