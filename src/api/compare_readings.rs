//! Compare graph endpoints
//!
//! Usage over `[curr_start, curr_end)` next to the usage over the same
//! window moved back by `shift`.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::NaiveDateTime;
use serde::Deserialize;

use super::series::{parse_ids, required, SeriesLoader};
use crate::{
    models::{parse_datetime, CompareReading, Shift},
    services::{readings, ConversionContext},
    utils::{AppError, AppResult},
    AppState,
};

pub(crate) fn routes() -> Router<AppState> {
    Router::new()
        .route("/meters/{ids}", get(meter_compare_readings))
        .route("/groups/{ids}", get(group_compare_readings))
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CompareParams {
    curr_start: Option<String>,
    curr_end: Option<String>,
    shift: Option<String>,
    #[serde(rename = "graphicUnitId")]
    graphic_unit_id: Option<String>,
}

type Window = (NaiveDateTime, NaiveDateTime);

/// Validated compare windows
#[derive(Debug, Clone, Copy)]
struct Windows {
    curr: Window,
    prev: Window,
}

impl CompareParams {
    fn windows(&self) -> AppResult<Windows> {
        let timestamp = |value: Option<&str>, name: &str| -> AppResult<NaiveDateTime> {
            let raw = value
                .ok_or_else(|| AppError::bad_request(format!("Missing query parameter: {}", name)))?;
            parse_datetime(raw)
                .ok_or_else(|| AppError::bad_request(format!("Invalid {}: {}", name, raw)))
        };

        let curr_start = timestamp(self.curr_start.as_deref(), "curr_start")?;
        let curr_end = timestamp(self.curr_end.as_deref(), "curr_end")?;
        if curr_start >= curr_end {
            return Err(AppError::bad_request("curr_start must be before curr_end"));
        }

        let shift: Shift = required(self.shift.as_deref(), "shift")?;
        let prev = readings::previous_window(curr_start, curr_end, &shift)
            .ok_or_else(|| AppError::bad_request("shift moves the window out of range"))?;

        Ok(Windows {
            curr: (curr_start, curr_end),
            prev,
        })
    }

    fn graphic_unit_id(&self) -> AppResult<i64> {
        required(self.graphic_unit_id.as_deref(), "graphicUnitId")
    }
}

/// Current and previous usage of one meter
async fn meter_usage(
    loader: &SeriesLoader,
    meter_id: i64,
    ctx: &ConversionContext,
    windows: &Windows,
) -> AppResult<Option<CompareReading>> {
    let curr = loader
        .readings(meter_id, Some(windows.curr.0), Some(windows.curr.1))
        .await?;
    let prev = loader
        .readings(meter_id, Some(windows.prev.0), Some(windows.prev.1))
        .await?;
    Ok(readings::compare_usage(&curr, &prev, windows.curr, windows.prev, ctx))
}

/// GET /api/compareReadings/meters/{ids}
async fn meter_compare_readings(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Query(params): Query<CompareParams>,
) -> AppResult<Json<BTreeMap<i64, CompareReading>>> {
    let ids = parse_ids(&ids)?;
    let windows = params.windows()?;
    let loader = SeriesLoader::new(&state, params.graphic_unit_id()?).await?;

    let mut result = BTreeMap::new();
    for id in ids {
        let Some(ctx) = loader.meter_context(id).await? else {
            continue;
        };
        if let Some(usage) = meter_usage(&loader, id, &ctx, &windows).await? {
            result.insert(id, usage);
        }
    }
    Ok(Json(result))
}

/// GET /api/compareReadings/groups/{ids}
async fn group_compare_readings(
    State(state): State<AppState>,
    Path(ids): Path<String>,
    Query(params): Query<CompareParams>,
) -> AppResult<Json<BTreeMap<i64, CompareReading>>> {
    let ids = parse_ids(&ids)?;
    let windows = params.windows()?;
    let loader = SeriesLoader::new(&state, params.graphic_unit_id()?).await?;

    let mut result = BTreeMap::new();
    'groups: for id in ids {
        let Some(contexts) = loader.group_contexts(id).await? else {
            continue;
        };

        let mut total = CompareReading {
            curr_use: 0.0,
            prev_use: 0.0,
        };
        for (meter_id, ctx) in &contexts {
            let Some(usage) = meter_usage(&loader, *meter_id, ctx, &windows).await? else {
                continue 'groups;
            };
            total.curr_use += usage.curr_use;
            total.prev_use += usage.prev_use;
        }
        result.insert(id, total);
    }
    Ok(Json(result))
}
