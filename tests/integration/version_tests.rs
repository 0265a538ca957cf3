//! Version endpoint tests

use crate::common::TestApp;

#[tokio::test]
async fn test_version_is_json_string() {
    let app = TestApp::new().await;

    let response = app.get("/api/version").await;
    response.assert_ok();

    let version: String = response.json();
    assert_eq!(version, env!("CARGO_PKG_VERSION"));
}
