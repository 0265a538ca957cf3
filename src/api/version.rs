use axum::Json;

/// GET /api/version
pub(crate) async fn get_version() -> Json<&'static str> {
    Json(env!("CARGO_PKG_VERSION"))
}
