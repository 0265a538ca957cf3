//! Preferences endpoint tests

use rstest::rstest;
use serde_json::{json, Value};

use crate::common::{admin_token, prepare_test, user_token, TestApp};
use energy_dashboard::models::UserRole;

#[tokio::test]
async fn test_get_preferences_is_public() {
    let app = TestApp::new().await;

    let response = app.get("/api/preferences").await;
    response.assert_ok();

    let body: Value = response.json();
    assert_eq!(body["displayTitle"], "");
    assert_eq!(body["defaultChartToRender"], "line");
    assert_eq!(body["defaultLanguage"], "en");
    assert_eq!(body["defaultMeterReadingFrequency"], 900);
    assert_eq!(body["defaultAreaUnit"], "meters");
    assert!(body["defaultGraphicUnit"].is_null());
}

#[tokio::test]
async fn test_admin_updates_preferences() {
    let app = TestApp::new().await;
    let token = admin_token(&app).await;

    let response = app
        .post_json_with_token(
            "/api/preferences",
            json!({ "preferences": {
                "displayTitle": "Campus Energy",
                "defaultChartToRender": "bar",
                "defaultBarStacking": true,
                "defaultLanguage": "fr"
            }}),
            &token,
        )
        .await;
    response.assert_ok();
    let body: Value = response.json();
    assert_eq!(body["displayTitle"], "Campus Energy");
    assert_eq!(body["defaultChartToRender"], "bar");

    // Untouched fields keep their values and the change is persisted
    let stored: Value = app.get("/api/preferences").await.json();
    assert_eq!(stored["displayTitle"], "Campus Energy");
    assert_eq!(stored["defaultBarStacking"], true);
    assert_eq!(stored["defaultLanguage"], "fr");
    assert_eq!(stored["defaultFileSizeLimit"], 25.0);
}

#[tokio::test]
async fn test_update_graphic_unit_must_exist() {
    let app = TestApp::new().await;
    let token = admin_token(&app).await;
    let fixture = prepare_test(&app).await;

    app.post_json_with_token(
        "/api/preferences",
        json!({ "preferences": { "defaultGraphicUnit": fixture.kwh.id } }),
        &token,
    )
    .await
    .assert_ok();

    app.post_json_with_token(
        "/api/preferences",
        json!({ "preferences": { "defaultGraphicUnit": 99999 } }),
        &token,
    )
    .await
    .assert_bad_request();

    let stored: Value = app.get("/api/preferences").await.json();
    assert_eq!(stored["defaultGraphicUnit"], fixture.kwh.id);
}

#[tokio::test]
async fn test_null_clears_graphic_unit_and_timezone() {
    let app = TestApp::new().await;
    let token = admin_token(&app).await;
    let fixture = prepare_test(&app).await;

    app.post_json_with_token(
        "/api/preferences",
        json!({ "preferences": {
            "defaultGraphicUnit": fixture.kwh.id,
            "defaultTimezone": "Europe/Lisbon"
        }}),
        &token,
    )
    .await
    .assert_ok();

    // Omitting a field keeps it
    app.post_json_with_token(
        "/api/preferences",
        json!({ "preferences": { "displayTitle": "Campus" } }),
        &token,
    )
    .await
    .assert_ok();
    let stored: Value = app.get("/api/preferences").await.json();
    assert_eq!(stored["defaultGraphicUnit"], fixture.kwh.id);
    assert_eq!(stored["defaultTimezone"], "Europe/Lisbon");

    app.post_json_with_token(
        "/api/preferences",
        json!({ "preferences": { "defaultGraphicUnit": null, "defaultTimezone": null } }),
        &token,
    )
    .await
    .assert_ok();
    let stored: Value = app.get("/api/preferences").await.json();
    assert!(stored["defaultGraphicUnit"].is_null());
    assert!(stored["defaultTimezone"].is_null());
}

#[tokio::test]
async fn test_update_without_token_is_forbidden() {
    let app = TestApp::new().await;

    app.post_json(
        "/api/preferences",
        json!({ "preferences": { "displayTitle": "Nope" } }),
    )
    .await
    .assert_forbidden();
}

#[tokio::test]
async fn test_update_with_bad_token_is_unauthorized() {
    let app = TestApp::new().await;

    app.post_json_with_token(
        "/api/preferences",
        json!({ "preferences": { "displayTitle": "Nope" } }),
        "garbage",
    )
    .await
    .assert_unauthorized();
}

#[rstest]
#[case(UserRole::Csv)]
#[case(UserRole::Export)]
#[case(UserRole::Obvius)]
#[tokio::test]
async fn test_update_by_non_admin_is_forbidden(#[case] role: UserRole) {
    let app = TestApp::new().await;
    let token = user_token(&app, role).await;

    app.post_json_with_token(
        "/api/preferences",
        json!({ "preferences": { "displayTitle": "Nope" } }),
        &token,
    )
    .await
    .assert_forbidden();

    let stored: Value = app.get("/api/preferences").await.json();
    assert_eq!(stored["displayTitle"], "");
}

#[rstest]
#[case(json!({ "defaultChartToRender": "pie" }))]
#[case(json!({ "defaultLanguage": "de" }))]
#[case(json!({ "defaultMeterReadingFrequency": 0 }))]
#[case(json!({ "defaultWarningFileSize": -1.0 }))]
#[case(json!({ "defaultWarningFileSize": 50.0, "defaultFileSizeLimit": 10.0 }))]
#[case(json!({ "noSuchPreference": true }))]
#[tokio::test]
async fn test_invalid_preferences_are_rejected(#[case] preferences: Value) {
    let app = TestApp::new().await;
    let token = admin_token(&app).await;

    app.post_json_with_token(
        "/api/preferences",
        json!({ "preferences": preferences }),
        &token,
    )
    .await
    .assert_bad_request();
}

#[tokio::test]
async fn test_update_requires_preferences_object() {
    let app = TestApp::new().await;
    let token = admin_token(&app).await;

    app.post_json_with_token("/api/preferences", json!({ "displayTitle": "x" }), &token)
        .await
        .assert_bad_request();
}
