//! API routes and handlers
//!
//! Every endpoint lives under `/api`.

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

mod compare_readings;
mod login;
mod preferences;
mod series;
mod unit_readings;
mod units;
mod verification;
mod version;

/// Create the full API router
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login::login))
        .route("/verification", post(verification::verify))
        .route(
            "/preferences",
            get(preferences::get_preferences).post(preferences::update_preferences),
        )
        .route("/units", get(units::list_units))
        .route("/version", get(version::get_version))
        .nest("/unitReadings", unit_readings::routes())
        .nest("/compareReadings", compare_readings::routes())
}
