//! Token verification tests

use axum::{body::Body, http::Request};
use serde_json::{json, Value};

use crate::common::{admin_token, create_admin, TestApp};
use energy_dashboard::services::AuthService;

#[tokio::test]
async fn test_valid_token_in_header() {
    let app = TestApp::new().await;
    let token = admin_token(&app).await;

    let response = app
        .post_json_with_token("/api/verification", json!({}), &token)
        .await;
    response.assert_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_valid_token_in_body() {
    let app = TestApp::new().await;
    let token = admin_token(&app).await;

    let response = app
        .post_json("/api/verification", json!({ "token": token }))
        .await;
    response.assert_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_valid_bearer_token() {
    let app = TestApp::new().await;
    let token = admin_token(&app).await;

    let request = Request::builder()
        .method("POST")
        .uri("/api/verification")
        .body(Body::empty())
        .unwrap();
    app.request_with_auth(request, &token).await.assert_ok();
}

#[tokio::test]
async fn test_invalid_token_is_unauthorized() {
    let app = TestApp::new().await;

    let response = app
        .post_json_with_token("/api/verification", json!({}), "not.a.token")
        .await;
    response.assert_unauthorized();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_missing_token_is_forbidden() {
    let app = TestApp::new().await;

    let response = app.post_json("/api/verification", json!({})).await;
    response.assert_forbidden();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_token_of_deleted_user_is_unauthorized() {
    let app = TestApp::new().await;
    let token = admin_token(&app).await;

    let admin = AuthService::new(app.state.db.clone())
        .get_user_by_username(crate::common::ADMIN_USERNAME)
        .await
        .unwrap()
        .unwrap();
    AuthService::new(app.state.db.clone())
        .delete_user(admin.id)
        .await
        .unwrap();

    app.post_json_with_token("/api/verification", json!({}), &token)
        .await
        .assert_unauthorized();
}

#[tokio::test]
async fn test_token_signed_with_other_secret_is_unauthorized() {
    let app = TestApp::new().await;
    let admin = create_admin(&app).await;

    let forged = energy_dashboard::middleware::auth::create_access_token(
        &admin,
        "a-completely-different-secret-of-enough-length",
        1,
    )
    .unwrap();

    app.post_json_with_token("/api/verification", json!({}), &forged)
        .await
        .assert_unauthorized();
}

fn raw_verification(body: &'static str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/api/verification")
        .header("Content-Type", "application/json");
    if let Some(token) = token {
        builder = builder.header("token", token);
    }
    builder.body(Body::from(body)).unwrap()
}

#[tokio::test]
async fn test_header_token_wins_over_malformed_body() {
    let app = TestApp::new().await;
    let token = admin_token(&app).await;

    let response = app.request(raw_verification("{not json", Some(&token))).await;
    response.assert_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn test_malformed_body_without_token_is_forbidden() {
    let app = TestApp::new().await;

    let response = app.request(raw_verification("{not json", None)).await;
    response.assert_forbidden();
    let body: Value = response.json();
    assert_eq!(body["success"], false);
}
