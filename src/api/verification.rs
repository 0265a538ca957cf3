//! Token verification endpoint

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    middleware::auth::{authenticate_token, extract_header_token, extract_query_token},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct VerificationRequest {
    token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct VerificationResponse {
    success: bool,
}

/// Check whether a token is still good
///
/// POST /api/verification
///
/// The token may also be sent as a `token` field of the JSON body. A body
/// that is not such an object is ignored.
pub(crate) async fn verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, Json<VerificationResponse>) {
    let token = extract_header_token(&headers)
        .or_else(|| body_token(&body))
        .or_else(|| extract_query_token(&uri));

    let Some(token) = token else {
        return (
            StatusCode::FORBIDDEN,
            Json(VerificationResponse { success: false }),
        );
    };

    match authenticate_token(&state, &token).await {
        Ok(_) => (StatusCode::OK, Json(VerificationResponse { success: true })),
        Err(err) => (err.status(), Json(VerificationResponse { success: false })),
    }
}

fn body_token(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<VerificationRequest>(body)
        .ok()
        .and_then(|request| request.token)
        .filter(|t| !t.is_empty())
}
