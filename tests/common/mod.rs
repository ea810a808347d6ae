//! Shared helpers for the Web API integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use axum_test::TestServer;
use serde_json::{json, Value};
use tempfile::TempDir;

use lif_auth::config::Config;
use lif_auth::db::Role;
use lif_auth::mail::RecordingMailer;
use lif_auth::web::middleware::LoginRateLimiter;
use lif_auth::web::{create_router, AppState};
use lif_auth::{moderation, AccessControl, Database};

/// Service token allowed to do everything the tests need.
pub const SERVICE_TOKEN: &str = "svc-full";

/// Service token that is known but holds no nodes.
pub const LIMITED_TOKEN: &str = "svc-limited";

/// A running test application.
pub struct TestApp {
    pub server: TestServer,
    pub db: Database,
    pub mailer: Arc<RecordingMailer>,
    _images: TempDir,
}

/// A registered test account.
pub struct TestAccount {
    pub username: String,
    pub user_id: String,
    pub token: String,
}

fn access_control() -> AccessControl {
    AccessControl::from_map([
        (
            SERVICE_TOKEN.to_string(),
            vec![
                "account.suspend".to_string(),
                "account.permissions".to_string(),
                "account.email".to_string(),
                "email.send_all".to_string(),
            ],
        ),
        (LIMITED_TOKEN.to_string(), vec![]),
    ])
}

/// Build a test application with a custom configuration.
pub async fn create_test_app_with(configure: impl FnOnce(&mut Config)) -> TestApp {
    let images = TempDir::new().expect("Failed to create image dir");

    let mut config = Config::default();
    config.storage.images_path = images.path().to_string_lossy().into_owned();
    config.web.login_rate_limit = 1000;
    configure(&mut config);

    let db = Database::open_in_memory()
        .await
        .expect("Failed to create test database");
    let mailer = Arc::new(RecordingMailer::new());

    let limiter = Arc::new(LoginRateLimiter::new(config.web.login_rate_limit));
    let state = AppState::new(db.clone(), config, access_control(), mailer.clone());
    let router = create_router(Arc::new(state), limiter);
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        db,
        mailer,
        _images: images,
    }
}

/// Build a test application with the default configuration.
pub async fn create_test_app() -> TestApp {
    create_test_app_with(|_| {}).await
}

impl TestApp {
    /// Register an account through the API.
    pub async fn register(&self, username: &str, password: &str) -> TestAccount {
        let response = self
            .server
            .post("/account/create_account")
            .json(&json!({
                "username": username,
                "password": password,
                "email": format!("{username}@example.com"),
            }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        let token = body["Token"].as_str().expect("token").to_string();

        let user_id: String = self
            .server
            .get(&format!("/account/get_id/{username}"))
            .await
            .json();

        TestAccount {
            username: username.to_string(),
            user_id,
            token,
        }
    }

    /// Register an account holding the moderator role.
    pub async fn register_moderator(&self, username: &str) -> TestAccount {
        let account = self.register(username, "modpass").await;
        moderation::set_role(self.db.pool(), &account.user_id, Role::Moderator)
            .await
            .expect("Failed to promote moderator");
        account
    }

    /// Grant a permission node directly.
    pub async fn grant(&self, account: &TestAccount, node: &str) {
        moderation::grant_node(self.db.pool(), &account.user_id, node)
            .await
            .expect("Failed to grant node");
    }
}
