//! Line, bar and 3D graph endpoints
//!
//! Every series is converted into the unit named by `graphicUnitId`. Ids
//! that are unknown or cannot be shown in that unit get an empty series.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use super::series::{parse_ids, required, time_interval, SeriesLoader};
use crate::{
    models::{BarReading, LineReading, ThreeDReadings, TimeInterval},
    services::{readings, MemberReadings},
    utils::{validation::validate_reading_interval, AppError, AppResult},
    AppState,
};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/line/meters/{ids}", get(meter_line_readings))
        .route("/line/groups/{ids}", get(group_line_readings))
        .route("/bar/meters/{ids}", get(meter_bar_readings))
        .route("/bar/groups/{ids}", get(group_bar_readings))
        .route("/threeD/meters/{id}", get(meter_three_d_readings))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphParams {
    time_interval: Option<String>,
    graphic_unit_id: Option<String>,
    bar_width_days: Option<String>,
    reading_interval: Option<String>,
}

impl GraphParams {
    fn graphic_unit_id(&self) -> AppResult<i64> {
        required(self.graphic_unit_id.as_deref(), "graphicUnitId")
    }

    fn bar_width_days(&self) -> AppResult<u32> {
        let days: u32 = required(self.bar_width_days.as_deref(), "barWidthDays")?;
        if days == 0 {
            return Err(AppError::bad_request("barWidthDays must be at least 1"));
        }
        Ok(days)
    }

    fn reading_interval(&self) -> AppResult<u32> {
        let hours: u32 = required(self.reading_interval.as_deref(), "readingInterval")?;
        if !validate_reading_interval(hours) {
            return Err(AppError::bad_request(format!(
                "readingInterval must divide a day evenly, got {}",
                hours
            )));
        }
        Ok(hours)
    }
}

/// Readings and conversions of every meter in a group, or `None` when the
/// group cannot be graphed
async fn load_group(
    loader: &SeriesLoader,
    group_id: i64,
    interval: &TimeInterval,
) -> AppResult<Option<Vec<MemberReadings>>> {
    let Some(contexts) = loader.group_contexts(group_id).await? else {
        return Ok(None);
    };

    let mut members = Vec::with_capacity(contexts.len());
    for (meter_id, ctx) in contexts {
        let readings = loader
            .readings(meter_id, interval.start, interval.end)
            .await?;
        members.push(MemberReadings { readings, ctx });
    }
    Ok(Some(members))
}

/// GET /api/unitReadings/line/meters/{ids}
async fn meter_line_readings(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Query(params): Query<GraphParams>,
) -> AppResult<Json<BTreeMap<i64, Vec<LineReading>>>> {
    let ids = parse_ids(&ids)?;
    let interval = time_interval(params.time_interval.as_deref())?;
    let loader = SeriesLoader::new(&state, params.graphic_unit_id()?).await?;

    let mut result = BTreeMap::new();
    for id in ids {
        let series = match loader.meter_context(id).await? {
            Some(ctx) => {
                let data = loader.readings(id, interval.start, interval.end).await?;
                readings::meter_line_readings(&data, &interval, &ctx, &state.config.readings)
            }
            None => Vec::new(),
        };
        result.insert(id, series);
    }
    Ok(Json(result))
}

/// GET /api/unitReadings/line/groups/{ids}
async fn group_line_readings(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Query(params): Query<GraphParams>,
) -> AppResult<Json<BTreeMap<i64, Vec<LineReading>>>> {
    let ids = parse_ids(&ids)?;
    let interval = time_interval(params.time_interval.as_deref())?;
    let loader = SeriesLoader::new(&state, params.graphic_unit_id()?).await?;

    let mut result = BTreeMap::new();
    for id in ids {
        let series = match load_group(&loader, id, &interval).await? {
            Some(members) => {
                readings::group_line_readings(&members, &interval, &state.config.readings)
            }
            None => Vec::new(),
        };
        result.insert(id, series);
    }
    Ok(Json(result))
}

/// GET /api/unitReadings/bar/meters/{ids}
async fn meter_bar_readings(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Query(params): Query<GraphParams>,
) -> AppResult<Json<BTreeMap<i64, Vec<BarReading>>>> {
    let ids = parse_ids(&ids)?;
    let interval = time_interval(params.time_interval.as_deref())?;
    let width = params.bar_width_days()?;
    let loader = SeriesLoader::new(&state, params.graphic_unit_id()?).await?;

    let mut result = BTreeMap::new();
    for id in ids {
        let series = match loader.meter_context(id).await? {
            Some(ctx) => {
                let data = loader.readings(id, interval.start, interval.end).await?;
                readings::meter_bar_readings(&data, &interval, width, &ctx)
            }
            None => Vec::new(),
        };
        result.insert(id, series);
    }
    Ok(Json(result))
}

/// GET /api/unitReadings/bar/groups/{ids}
async fn group_bar_readings(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Query(params): Query<GraphParams>,
) -> AppResult<Json<BTreeMap<i64, Vec<BarReading>>>> {
    let ids = parse_ids(&ids)?;
    let interval = time_interval(params.time_interval.as_deref())?;
    let width = params.bar_width_days()?;
    let loader = SeriesLoader::new(&state, params.graphic_unit_id()?).await?;

    let mut result = BTreeMap::new();
    for id in ids {
        let series = match load_group(&loader, id, &interval).await? {
            Some(members) => readings::group_bar_readings(&members, &interval, width),
            None => Vec::new(),
        };
        result.insert(id, series);
    }
    Ok(Json(result))
}

/// GET /api/unitReadings/threeD/meters/{id}
async fn meter_three_d_readings(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<GraphParams>,
) -> AppResult<Json<ThreeDReadings>> {
    let id: i64 = id
        .parse()
        .map_err(|_| AppError::bad_request(format!("Invalid meter id: {}", id)))?;
    let interval = time_interval(params.time_interval.as_deref())?;
    let hours = params.reading_interval()?;
    let loader = SeriesLoader::new(&state, params.graphic_unit_id()?).await?;

    let Some(ctx) = loader.meter_context(id).await? else {
        return Ok(Json(ThreeDReadings::default()));
    };
    let data = loader.readings(id, interval.start, interval.end).await?;

    Ok(Json(readings::meter_three_d_readings(&data, &interval, hours, &ctx)))
}
