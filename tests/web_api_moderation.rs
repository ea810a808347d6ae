//! Web API Moderation Tests
//!
//! Integration tests for moderator-only endpoints.

mod common;

use axum::http::{HeaderName, StatusCode};
use axum_test::TestRequest;
use serde_json::{json, Value};

use common::{create_test_app, TestAccount, TestApp};

fn with_creds(request: TestRequest, account: &TestAccount) -> TestRequest {
    request
        .add_header(HeaderName::from_static("username"), account.username.clone())
        .add_header(HeaderName::from_static("token"), account.token.clone())
}

async fn file_report(app: &TestApp, user: &str, reason: &str) {
    app.server
        .post("/account/report")
        .form(&json!({
            "user": user,
            "service": "Ringer",
            "reason": reason,
            "content": "some content",
        }))
        .await
        .assert_status_ok();
}

// ============================================================================
// Suspension
// ============================================================================

#[tokio::test]
async fn test_suspend_requires_moderator() {
    let app = create_test_app().await;
    let alice = app.register("alice", "pw123").await;
    app.register("bob", "pw123").await;

    with_creds(app.server.post("/moderation/suspend_account"), &alice)
        .form(&json!({"user": "bob"}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.server
        .post("/moderation/suspend_account")
        .form(&json!({"user": "bob"}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_moderator_suspends_account() {
    let app = create_test_app().await;
    let moderator = app.register_moderator("mod").await;
    let bob = app.register("bob", "pw123").await;

    let response = with_creds(app.server.post("/moderation/suspend_account"), &moderator)
        .form(&json!({"user": "bob"}))
        .await;
    response.assert_status_ok();

    app.server
        .post("/auth/verify_token")
        .form(&json!({"username": "bob", "token": bob.token}))
        .await
        .assert_status(StatusCode::FORBIDDEN);

    with_creds(app.server.post("/moderation/suspend_account"), &moderator)
        .form(&json!({"user": "ghost"}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_v1_suspend_account_path() {
    let app = create_test_app().await;
    let moderator = app.register_moderator("mod").await;
    let bob = app.register("bob", "pw123").await;

    with_creds(app.server.post("/moderation/v1/suspend-account"), &moderator)
        .form(&json!({"user": "bob"}))
        .await
        .assert_status_ok();

    app.server
        .post("/auth/verify_token")
        .form(&json!({"username": "bob", "token": bob.token}))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test]
async fn test_report_workflow() {
    let app = create_test_app().await;
    let moderator = app.register_moderator("mod").await;
    app.register("bob", "pw123").await;

    file_report(&app, "bob", "Spam").await;
    file_report(&app, "bob", "Harassment").await;

    let reports: Vec<Value> = with_creds(app.server.get("/moderation/reports"), &moderator)
        .await
        .json();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["reason"], "Spam");
    assert_eq!(reports[0]["resolved"], false);

    let id = reports[0]["id"].as_i64().expect("report id");

    let report: Value = with_creds(app.server.get(&format!("/moderation/reports/{id}")), &moderator)
        .await
        .json();
    assert_eq!(report["user"], "bob");

    with_creds(app.server.post("/moderation/reports/resolve"), &moderator)
        .form(&json!({"report_id": id}))
        .await
        .assert_status_ok();

    let unresolved: Vec<Value> = with_creds(app.server.get("/moderation/reports"), &moderator)
        .add_query_param("search_filter", "unresolved")
        .await
        .json();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0]["reason"], "Harassment");

    let resolved: Vec<Value> = with_creds(app.server.get("/moderation/reports"), &moderator)
        .add_query_param("search_filter", "resolved")
        .await
        .json();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0]["id"], id);
}

#[tokio::test]
async fn test_report_legacy_paths() {
    let app = create_test_app().await;
    let moderator = app.register_moderator("mod").await;
    app.register("bob", "pw123").await;
    file_report(&app, "bob", "Spam").await;

    for path in ["/moderation/reports/get_reports", "/moderation/reports/v1/get"] {
        let reports: Vec<Value> = with_creds(app.server.get(path), &moderator).await.json();
        assert_eq!(reports.len(), 1, "{path}");
    }

    let reports: Vec<Value> = with_creds(app.server.get("/moderation/reports"), &moderator)
        .await
        .json();
    let id = reports[0]["id"].as_i64().expect("report id");

    for path in [
        format!("/moderation/reports/get_report/{id}"),
        format!("/moderation/reports/v1/get/{id}"),
    ] {
        let report: Value = with_creds(app.server.get(&path), &moderator).await.json();
        assert_eq!(report["reason"], "Spam", "{path}");
    }

    with_creds(app.server.post("/moderation/reports/v1/resolve"), &moderator)
        .form(&json!({"report_id": id}))
        .await
        .assert_status_ok();

    let resolved: Vec<Value> = with_creds(app.server.get("/moderation/reports/get_reports"), &moderator)
        .add_query_param("search_filter", "resolved")
        .await
        .json();
    assert_eq!(resolved.len(), 1);
}

#[tokio::test]
async fn test_report_errors() {
    let app = create_test_app().await;
    let moderator = app.register_moderator("mod").await;
    let alice = app.register("alice", "pw123").await;

    with_creds(app.server.get("/moderation/reports"), &alice)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    with_creds(app.server.get("/moderation/reports"), &moderator)
        .add_query_param("search_filter", "everything")
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    with_creds(app.server.get("/moderation/reports/999"), &moderator)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    with_creds(app.server.post("/moderation/reports/resolve"), &moderator)
        .form(&json!({"report_id": 999}))
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// User search and privileges
// ============================================================================

#[tokio::test]
async fn test_search_users_requires_node() {
    let app = create_test_app().await;
    let searcher = app.register("searcher", "pw123").await;
    app.register("alice", "pw123").await;
    app.register("alfred", "pw123").await;
    app.register("bob", "pw123").await;

    with_creds(app.server.get("/moderation/search_users"), &searcher)
        .add_query_param("query", "al")
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.grant(&searcher, "moderation.search_users").await;

    let results: Vec<Value> = with_creds(app.server.get("/moderation/search_users"), &searcher)
        .add_query_param("query", "al")
        .await
        .json();
    let mut names: Vec<&str> = results
        .iter()
        .filter_map(|r| r["username"].as_str())
        .collect();
    names.sort();
    assert_eq!(names, vec!["alfred", "alice"]);
}

#[tokio::test]
async fn test_manage_privileges() {
    let app = create_test_app().await;
    let admin = app.register("admin", "pw123").await;
    let alice = app.register("alice", "pw123").await;
    app.grant(&alice, "old.node").await;

    let body = json!([
        {"userId": alice.user_id, "role": "MODERATOR", "permissions": ["ringer.access"]},
        {"userId": "no-such-id", "permissions": []},
    ]);

    with_creds(app.server.post("/moderation/manage_privileges"), &admin)
        .json(&body)
        .await
        .assert_status(StatusCode::FORBIDDEN);

    app.grant(&admin, "moderation.manage_privileges").await;

    let response = with_creds(app.server.post("/moderation/manage_privileges"), &admin)
        .json(&body)
        .await;
    response.assert_status_ok();
    let outcome: Value = response.json();
    assert_eq!(outcome["updated"], json!([alice.user_id]));
    assert_eq!(outcome["notFound"], json!(["no-such-id"]));

    app.server
        .post("/auth/verify_token")
        .add_query_param("permissions", "ringer.access")
        .add_query_param("role", "MODERATOR")
        .form(&json!({"username": "alice", "token": alice.token}))
        .await
        .assert_status_ok();

    app.server
        .post("/auth/verify_token")
        .add_query_param("permissions", "old.node")
        .form(&json!({"username": "alice", "token": alice.token}))
        .await
        .assert_status(StatusCode::FORBIDDEN);
}
