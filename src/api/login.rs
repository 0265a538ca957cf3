//! Login endpoint

use axum::{extract::State, Json};
use tracing::{info, warn};

use crate::{
    middleware::auth::create_access_token,
    models::{LoginRequest, LoginResponse},
    services::AuthService,
    utils::{AppError, AppResult},
    AppState,
};

/// Exchange credentials for a token
///
/// POST /api/login
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (Some(username), Some(password)) = (payload.username, payload.password) else {
        return Err(AppError::bad_request("Both username and password are required"));
    };

    let user = AuthService::new(state.db.clone())
        .authenticate(&username, &password)
        .await?
        .ok_or_else(|| {
            warn!(username = %username, "Rejected login");
            AppError::unauthorized("Invalid username or password")
        })?;

    let token = create_access_token(
        &user,
        &state.config.auth.jwt_secret,
        state.config.auth.token_expiry_hours,
    )
    .map_err(|e| AppError::internal(format!("Failed to create access token: {}", e)))?;

    info!(username = %user.username, role = %user.role, "User logged in");

    Ok(Json(LoginResponse {
        token,
        username: user.username,
        role: user.role,
    }))
}
