//! Units endpoint

use axum::{extract::State, Json};

use crate::{
    db::UnitRepository,
    middleware::MaybeAuthUser,
    models::{Displayable, Unit},
    utils::AppResult,
    AppState,
};

/// List units; admins see every unit, everyone else only public ones
///
/// GET /api/units
pub(crate) async fn list_units(
    State(state): State<AppState>,
    MaybeAuthUser(user): MaybeAuthUser,
) -> AppResult<Json<Vec<Unit>>> {
    let is_admin = user.as_ref().is_some_and(|u| u.is_admin());

    let units = UnitRepository::new(state.db.clone())
        .list_all()
        .await?
        .into_iter()
        .filter(|unit| is_admin || unit.displayable == Displayable::All)
        .collect();

    Ok(Json(units))
}
