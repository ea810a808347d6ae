//! Account handlers.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::HeaderMap,
    response::{IntoResponse, Response},
    Form, Json,
};
use tracing::{error, info};

use crate::auth::{
    self, bulk_emails, check_token, create_account as register, email_in_use, get_email,
    get_user_id, get_username as lookup_username, update_personalization as personalize,
    username_in_use, validation::validate_email, verify_credentials, RegistrationRequest,
};
use crate::db::{AccountKey, NewReport};
use crate::mail::messages;
use crate::moderation;
use crate::profile::ImageKind;
use crate::LifError;
use crate::web::dto::{
    validation::sanitize_string, CreateAccountRequest, CreateAccountResponse, EmailResponse,
    GetInfoQuery, PersonalizationForm, ReportForm, StatusResponse, UpdateEmailForm,
    UpdatePasswordForm, ValidatedForm, ValidatedJson,
};
use crate::web::error::ApiError;
use crate::web::extract::{HeaderCredentials, ServiceToken};
use crate::web::state::AppState;

/// GET /account/reset_token - Replace the session token, signing out every client.
#[utoipa::path(
    get,
    path = "/account/reset_token",
    tag = "account",
    responses(
        (status = 200, description = "Token reset", body = String),
        (status = 400, description = "Username or token missing"),
        (status = 401, description = "Invalid token")
    )
)]
pub async fn reset_token(
    State(state): State<Arc<AppState>>,
    creds: HeaderCredentials,
) -> Result<Json<&'static str>, ApiError> {
    let account = creds.authenticate(state.pool()).await?;
    auth::reset_token(state.pool(), &account.username).await?;
    Ok(Json("Token Reset"))
}

/// Fields of an image upload.
struct ImageUpload {
    username: String,
    token: String,
    content: Vec<u8>,
}

async fn read_image_upload(mut multipart: Multipart) -> Result<ImageUpload, ApiError> {
    let mut username: Option<String> = None;
    let mut token: Option<String> = None;
    let mut content: Option<Vec<u8>> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                content = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|_| ApiError::bad_request("Failed to read file"))?
                        .to_vec(),
                );
            }
            "username" => {
                username = Some(
                    field
                        .text()
                        .await
                        .map_err(|_| ApiError::bad_request("Invalid username"))?,
                );
            }
            "token" => {
                token = Some(
                    field
                        .text()
                        .await
                        .map_err(|_| ApiError::bad_request("Invalid token"))?,
                );
            }
            _ => {}
        }
    }

    match (username, token, content) {
        (Some(username), Some(token), Some(content)) => Ok(ImageUpload {
            username,
            token,
            content,
        }),
        _ => Err(ApiError::bad_request("file, username and token are required")),
    }
}

async fn store_image(
    state: &AppState,
    kind: ImageKind,
    multipart: Multipart,
) -> Result<Json<StatusResponse>, ApiError> {
    let upload = read_image_upload(multipart).await?;
    let account = check_token(state.pool(), &upload.username, &upload.token).await?;

    state
        .images
        .save(kind, &account.username, &upload.content)
        .await?;

    info!(username = %account.username, kind = kind.dir_name(), "profile image updated");
    Ok(Json(StatusResponse::ok()))
}

/// POST /account/update_avatar - Upload a new avatar.
///
/// Request body: multipart/form-data with "file", "username" and "token" fields.
#[utoipa::path(
    post,
    path = "/account/update_avatar",
    tag = "account",
    responses(
        (status = 200, description = "Avatar stored", body = StatusResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid token")
    )
)]
pub async fn update_avatar(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<StatusResponse>, ApiError> {
    store_image(&state, ImageKind::Avatar, multipart).await
}

/// POST /account/update_profile_banner - Upload a new banner.
///
/// Request body: multipart/form-data with "file", "username" and "token" fields.
#[utoipa::path(
    post,
    path = "/account/update_profile_banner",
    tag = "account",
    responses(
        (status = 200, description = "Banner stored", body = StatusResponse),
        (status = 400, description = "Missing fields"),
        (status = 401, description = "Invalid token")
    )
)]
pub async fn update_banner(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<StatusResponse>, ApiError> {
    store_image(&state, ImageKind::Banner, multipart).await
}

/// POST /account/update_info/personalization - Update bio and pronouns.
#[utoipa::path(
    post,
    path = "/account/update_info/personalization",
    tag = "account",
    request_body(content = PersonalizationForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Profile updated", body = String),
        (status = 400, description = "Bio or pronouns too long"),
        (status = 401, description = "Invalid token")
    )
)]
pub async fn update_personalization(
    State(state): State<Arc<AppState>>,
    Form(form): Form<PersonalizationForm>,
) -> Result<Json<&'static str>, ApiError> {
    let account = check_token(state.pool(), &form.username, &form.token).await?;
    let bio = sanitize_string(&form.bio);
    let pronouns = sanitize_string(&form.pronouns);
    personalize(state.pool(), &account.username, &bio, &pronouns).await?;
    Ok(Json("Updated Successfully"))
}

/// GET /account/get_info/{data}/{account} - Read private account data on behalf of a service.
///
/// With `account` set to `USE_HEADERS`, the comma separated `accounts`
/// header names the accounts and a list of emails is returned.
#[utoipa::path(
    get,
    path = "/account/get_info/{data}/{account}",
    tag = "account",
    params(
        ("data" = String, Path, description = "Requested data, only `email` is supported"),
        ("account" = String, Path, description = "Username, or `USE_HEADERS` for a bulk lookup"),
        GetInfoQuery
    ),
    responses(
        (status = 200, description = "Requested data", body = EmailResponse),
        (status = 400, description = "Missing header or unknown data type"),
        (status = 401, description = "Unknown service token"),
        (status = 403, description = "Service lacks account.email"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_info(
    State(state): State<Arc<AppState>>,
    ServiceToken(access_token): ServiceToken,
    Path((data, account)): Path<(String, String)>,
    Query(query): Query<GetInfoQuery>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if !state.access_control.verify_token(&access_token) {
        return Err(LifError::UnknownServiceToken.into());
    }
    if data != "email" {
        return Err(ApiError::bad_request("Unknown Data Type!"));
    }
    state.access_control.authorize(&access_token, "account.email")?;

    if account != "USE_HEADERS" {
        let email = get_email(state.pool(), &account).await?;
        return Ok(Json(EmailResponse { email }).into_response());
    }

    let accounts: Vec<String> = headers
        .get("accounts")
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    if accounts.is_empty() {
        return Err(ApiError::bad_request("Accounts header required."));
    }

    let key = match query.search_mode.as_deref().unwrap_or("username") {
        "username" => AccountKey::Username,
        "userID" => AccountKey::UserId,
        _ => return Err(ApiError::bad_request("Invalid search mode.")),
    };

    let emails = bulk_emails(state.pool(), &accounts, key).await?;
    Ok(Json(emails).into_response())
}

/// POST /account/create_account - Register a new account.
#[utoipa::path(
    post,
    path = "/account/create_account",
    tag = "account",
    request_body = CreateAccountRequest,
    responses(
        (status = 200, description = "Account created", body = CreateAccountResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Username or email taken")
    )
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateAccountRequest>,
) -> Result<Json<CreateAccountResponse>, ApiError> {
    let mut request = RegistrationRequest::new(&req.username, &req.email, &req.password);
    if let Some(pronouns) = req.pronouns {
        request = request.with_pronouns(pronouns);
    }

    let account = register(state.pool(), state.scheme(), &request).await?;

    let mailer = state.mailer.clone();
    let welcome = messages::welcome(&account.email, &account.username);
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&welcome).await {
            error!(error = %e, "failed to send welcome email");
        }
    });

    Ok(Json(CreateAccountResponse {
        status: "Ok",
        username: account.username,
        token: account.token,
    }))
}

/// GET /account/check_info_usage/{type}/{info} - Check whether a username or email is free.
///
/// `emailValid` checks the email format instead of availability.
#[utoipa::path(
    get,
    path = "/account/check_info_usage/{type}/{info}",
    tag = "account",
    params(
        ("type" = String, Path, description = "`username`, `email` or `emailValid`"),
        ("info" = String, Path, description = "Value to check")
    ),
    responses(
        (status = 200, description = "Value is available", body = StatusResponse),
        (status = 400, description = "Invalid email or unknown type"),
        (status = 409, description = "Value already in use")
    )
)]
pub async fn check_info_usage(
    State(state): State<Arc<AppState>>,
    Path((kind, info)): Path<(String, String)>,
) -> Result<Json<StatusResponse>, ApiError> {
    match kind.as_str() {
        "username" => {
            if username_in_use(state.pool(), &info).await? {
                return Err(ApiError::conflict("Username already in use!"));
            }
        }
        "email" => {
            if email_in_use(state.pool(), &info).await? {
                return Err(ApiError::conflict("Email already in use!"));
            }
        }
        "emailValid" => {
            validate_email(&info).map_err(|_| ApiError::bad_request("Invalid Email!"))?;
        }
        _ => return Err(ApiError::bad_request("Unknown info type")),
    }
    Ok(Json(StatusResponse::ok()))
}

/// POST /account/update_email - Change the account email.
#[utoipa::path(
    post,
    path = "/account/update_email",
    tag = "account",
    request_body(content = UpdateEmailForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Email updated", body = String),
        (status = 400, description = "Invalid email"),
        (status = 401, description = "Invalid credentials"),
        (status = 409, description = "Email taken")
    )
)]
pub async fn update_email(
    State(state): State<Arc<AppState>>,
    Form(form): Form<UpdateEmailForm>,
) -> Result<Json<&'static str>, ApiError> {
    let account = verify_credentials(state.pool(), state.scheme(), &form.username, &form.password).await?;
    auth::update_email(state.pool(), &account.user_id, &form.email).await?;
    Ok(Json("Ok"))
}

/// GET /account/get_username/{account_id} - Username of an account id.
#[utoipa::path(
    get,
    path = "/account/get_username/{account_id}",
    tag = "account",
    params(("account_id" = String, Path, description = "Account id")),
    responses(
        (status = 200, description = "Username", body = String),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_username(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> Result<Json<String>, ApiError> {
    Ok(Json(lookup_username(state.pool(), &account_id).await?))
}

/// GET /account/get_id/{username} - Account id of a username.
#[utoipa::path(
    get,
    path = "/account/get_id/{username}",
    tag = "account",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Account id", body = String),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_id(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<String>, ApiError> {
    Ok(Json(get_user_id(state.pool(), &username).await?))
}

/// GET /account/v1/2fa-setup - Provisioning URI for an authenticator app.
#[utoipa::path(
    get,
    path = "/account/v1/2fa-setup",
    tag = "account",
    responses(
        (status = 200, description = "otpauth:// provisioning URI", body = String),
        (status = 400, description = "Username or token missing"),
        (status = 401, description = "Invalid token"),
        (status = 403, description = "Account suspended")
    )
)]
pub async fn two_factor_setup(
    State(state): State<Arc<AppState>>,
    creds: HeaderCredentials,
) -> Result<Json<String>, ApiError> {
    let account = creds.authenticate(state.pool()).await?;
    Ok(Json(auth::setup_two_factor(state.pool(), &account).await?))
}

/// POST /account/update_password - Change the password.
#[utoipa::path(
    post,
    path = "/account/update_password",
    tag = "account",
    request_body(content = UpdatePasswordForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Password updated", body = String),
        (status = 400, description = "Invalid new password"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn update_password(
    State(state): State<Arc<AppState>>,
    Form(form): Form<UpdatePasswordForm>,
) -> Result<Json<&'static str>, ApiError> {
    let account = verify_credentials(
        state.pool(),
        state.scheme(),
        &form.username,
        &form.current_password,
    )
    .await?;
    auth::update_password(state.pool(), state.scheme(), &account.username, &form.new_password).await?;
    Ok(Json("Updated Password"))
}

/// POST /account/report - Report a user.
#[utoipa::path(
    post,
    path = "/account/report",
    tag = "account",
    request_body(content = ReportForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Report filed", body = String),
        (status = 400, description = "Unknown service or invalid input"),
        (status = 404, description = "User not found")
    )
)]
pub async fn report(
    State(state): State<Arc<AppState>>,
    ValidatedForm(form): ValidatedForm<ReportForm>,
) -> Result<Json<&'static str>, ApiError> {
    let report = NewReport::new(form.user, form.service, form.reason, form.content);
    moderation::submit_report(state.pool(), &state.config.reports.accepted_services, &report).await?;
    Ok(Json("Ok"))
}
