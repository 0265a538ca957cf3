//! Shared plumbing of the graphing endpoints: query parsing and loading
//! meters, groups and readings for a graphic unit

use std::str::FromStr;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::{
    db::{DbPool, GroupRepository, MeterRepository, ReadingRepository, UnitRepository},
    models::{Reading, TimeInterval, Unit},
    services::ConversionContext,
    utils::{validation::parse_id_list, AppError, AppResult},
    AppState,
};

/// Parse the `:ids` path segment
pub(crate) fn parse_ids(raw: &str) -> AppResult<Vec<i64>> {
    parse_id_list(raw).ok_or_else(|| AppError::bad_request(format!("Invalid id list: {}", raw)))
}

/// A required query parameter parsed with `FromStr`
pub(crate) fn required<T: FromStr>(value: Option<&str>, name: &str) -> AppResult<T> {
    let raw = value
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::bad_request(format!("Missing query parameter: {}", name)))?;
    raw.parse()
        .map_err(|_| AppError::bad_request(format!("Invalid {}: {}", name, raw)))
}

pub(crate) fn time_interval(value: Option<&str>) -> AppResult<TimeInterval> {
    required(value, "timeInterval")
}

/// Loads what a graph needs, converting into one graphic unit
pub(crate) struct SeriesLoader {
    db: DbPool,
    graphic_unit: Option<Unit>,
}

impl SeriesLoader {
    pub(crate) async fn new(state: &AppState, graphic_unit_id: i64) -> AppResult<Self> {
        let graphic_unit = UnitRepository::new(state.db.clone())
            .get_by_id(graphic_unit_id)
            .await?;
        if graphic_unit.is_none() {
            debug!(graphic_unit_id, "Graph requested in an unknown unit");
        }

        Ok(Self {
            db: state.db.clone(),
            graphic_unit,
        })
    }

    /// How a meter converts into the graphic unit; `None` when the meter is
    /// unknown or cannot be shown in that unit
    pub(crate) async fn meter_context(&self, meter_id: i64) -> AppResult<Option<ConversionContext>> {
        let Some(graphic_unit) = &self.graphic_unit else {
            return Ok(None);
        };
        let Some(meter) = MeterRepository::new(self.db.clone()).get_by_id(meter_id).await? else {
            return Ok(None);
        };

        let units = UnitRepository::new(self.db.clone());
        let Some(meter_unit) = units.get_by_id(meter.unit_id).await? else {
            return Ok(None);
        };
        let Some(cik) = units.get_cik(meter.unit_id, graphic_unit.id).await? else {
            return Ok(None);
        };

        Ok(Some(ConversionContext {
            represent: meter_unit.unit_represent,
            sec_in_rate: graphic_unit.sec_in_rate,
            cik,
        }))
    }

    /// Every meter of a group with its conversion. `None` when the group is
    /// unknown or any of its meters cannot be shown in the graphic unit.
    pub(crate) async fn group_contexts(
        &self,
        group_id: i64,
    ) -> AppResult<Option<Vec<(i64, ConversionContext)>>> {
        let groups = GroupRepository::new(self.db.clone());
        if groups.get_by_id(group_id).await?.is_none() {
            return Ok(None);
        }

        let mut contexts = Vec::new();
        for meter_id in groups.deep_meter_ids(group_id).await? {
            match self.meter_context(meter_id).await? {
                Some(ctx) => contexts.push((meter_id, ctx)),
                None => {
                    debug!(group_id, meter_id, "Group member cannot be graphed in this unit");
                    return Ok(None);
                }
            }
        }
        Ok(Some(contexts))
    }

    pub(crate) async fn readings(
        &self,
        meter_id: i64,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> AppResult<Vec<Reading>> {
        ReadingRepository::new(self.db.clone())
            .overlapping(meter_id, start, end)
            .await
    }
}
