//! Site preferences endpoints

use axum::{extract::State, Json};
use tracing::info;
use validator::Validate;

use crate::{
    db::{PreferencesRepository, UnitRepository},
    middleware::AdminUser,
    models::{Preferences, PreferencesRequest},
    utils::{AppError, AppResult},
    AppState,
};

/// GET /api/preferences
pub(crate) async fn get_preferences(State(state): State<AppState>) -> AppResult<Json<Preferences>> {
    let preferences = PreferencesRepository::new(state.db.clone()).get().await?;
    Ok(Json(preferences))
}

/// Partially update the preferences
///
/// POST /api/preferences
pub(crate) async fn update_preferences(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(body): Json<serde_json::Value>,
) -> AppResult<Json<Preferences>> {
    let request: PreferencesRequest = serde_json::from_value(body)?;
    request.preferences.validate()?;

    if let Some(Some(unit_id)) = request.preferences.default_graphic_unit {
        UnitRepository::new(state.db.clone())
            .get_by_id(unit_id)
            .await?
            .ok_or_else(|| AppError::bad_request(format!("Unknown graphic unit: {}", unit_id)))?;
    }

    let repo = PreferencesRepository::new(state.db.clone());
    let merged = repo
        .get()
        .await?
        .merged(request.preferences)
        .map_err(AppError::bad_request)?;
    let updated = repo.update(&merged).await?;

    info!(username = %admin.username, "Preferences updated");
    Ok(Json(updated))
}
