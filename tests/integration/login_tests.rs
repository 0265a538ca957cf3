//! Login endpoint tests

use serde_json::{json, Value};

use crate::common::{create_admin, create_user, TestApp, ADMIN_PASSWORD, ADMIN_USERNAME};
use energy_dashboard::{middleware::auth::validate_token, models::UserRole};

#[tokio::test]
async fn test_login_returns_token_for_valid_credentials() {
    let app = TestApp::new().await;
    let admin = create_admin(&app).await;

    let response = app
        .post_json(
            "/api/login",
            json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD }),
        )
        .await;
    response.assert_ok();

    let body: Value = response.json();
    assert_eq!(body["username"], ADMIN_USERNAME);
    assert_eq!(body["role"], "admin");

    let token = body["token"].as_str().unwrap();
    let claims = validate_token(token, &app.state.config.auth.jwt_secret)
        .unwrap()
        .claims;
    assert_eq!(claims.sub, admin.id.to_string());
    assert_eq!(claims.role, UserRole::Admin);
}

#[tokio::test]
async fn test_login_reports_non_admin_role() {
    let app = TestApp::new().await;
    create_user(&app, "csv@example.com", "csv-password", UserRole::Csv).await;

    let response = app
        .post_json(
            "/api/login",
            json!({ "username": "csv@example.com", "password": "csv-password" }),
        )
        .await;
    response.assert_ok();
    let body: Value = response.json();
    assert_eq!(body["role"], "csv");
}

#[tokio::test]
async fn test_login_rejects_wrong_password() {
    let app = TestApp::new().await;
    create_admin(&app).await;

    let response = app
        .post_json(
            "/api/login",
            json!({ "username": ADMIN_USERNAME, "password": "not-the-password" }),
        )
        .await;
    response.assert_unauthorized();
    let body: Value = response.json();
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_login_rejects_unknown_user() {
    let app = TestApp::new().await;

    app.post_json(
        "/api/login",
        json!({ "username": "nobody@example.com", "password": "whatever-password" }),
    )
    .await
    .assert_unauthorized();
}

#[tokio::test]
async fn test_login_unknown_user_and_wrong_password_look_alike() {
    let app = TestApp::new().await;
    create_admin(&app).await;

    let unknown = app
        .post_json(
            "/api/login",
            json!({ "username": "nobody@example.com", "password": ADMIN_PASSWORD }),
        )
        .await;
    let wrong = app
        .post_json(
            "/api/login",
            json!({ "username": ADMIN_USERNAME, "password": "not-the-password" }),
        )
        .await;

    assert_eq!(unknown.status, wrong.status);
    assert_eq!(unknown.text(), wrong.text());
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let app = TestApp::new().await;
    create_admin(&app).await;

    app.post_json("/api/login", json!({ "username": ADMIN_USERNAME }))
        .await
        .assert_bad_request();
    app.post_json("/api/login", json!({ "password": ADMIN_PASSWORD }))
        .await
        .assert_bad_request();
    app.post_json("/api/login", json!({}))
        .await
        .assert_bad_request();
}
