//! Reading model and the series shapes returned by the readings endpoints

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A single measurement covering `[start_timestamp, end_timestamp)`
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub meter_id: i64,
    pub reading: f64,
    pub start_timestamp: NaiveDateTime,
    pub end_timestamp: NaiveDateTime,
}

impl Reading {
    pub fn new(
        meter_id: i64,
        reading: f64,
        start_timestamp: NaiveDateTime,
        end_timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            meter_id,
            reading,
            start_timestamp,
            end_timestamp,
        }
    }

    pub fn duration_secs(&self) -> i64 {
        (self.end_timestamp - self.start_timestamp).num_seconds()
    }
}

/// Epoch milliseconds of a wall-clock timestamp, as sent to clients
pub fn epoch_millis(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp_millis()
}

/// Point on a line graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineReading {
    pub reading: f64,
    pub min: f64,
    pub max: f64,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
}

/// One bar of a bar graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BarReading {
    pub reading: f64,
    pub start_timestamp: i64,
    pub end_timestamp: i64,
}

/// Usage in the current window and in the shifted previous window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareReading {
    pub curr_use: f64,
    pub prev_use: f64,
}

/// Time-of-day slot on the x axis of a 3D graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDSlot {
    pub start_timestamp: i64,
    pub end_timestamp: i64,
}

/// 3D graph data: one row of slot values per day
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreeDReadings {
    pub x_data: Vec<ThreeDSlot>,
    pub y_data: Vec<i64>,
    pub z_data: Vec<Vec<Option<f64>>>,
}
