//! Meter and group models

use serde::{Deserialize, Serialize};

/// Meter entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Meter {
    pub id: i64,
    pub name: String,
    pub identifier: String,
    pub unit_id: i64,
    pub default_graphic_unit: Option<i64>,
    pub enabled: bool,
    pub displayable: bool,
    /// Expected seconds between readings
    pub reading_frequency: i64,
    pub note: String,
}

#[derive(Debug, Clone)]
pub struct NewMeter {
    pub name: String,
    pub identifier: String,
    pub unit_id: i64,
    pub default_graphic_unit: Option<i64>,
    pub enabled: bool,
    pub displayable: bool,
    pub reading_frequency: i64,
    pub note: String,
}

impl NewMeter {
    pub fn new(name: &str, unit_id: i64, default_graphic_unit: Option<i64>) -> Self {
        Self {
            name: name.to_string(),
            identifier: name.to_string(),
            unit_id,
            default_graphic_unit,
            enabled: true,
            displayable: true,
            reading_frequency: 900,
            note: String::new(),
        }
    }

    pub fn with_reading_frequency(mut self, seconds: i64) -> Self {
        self.reading_frequency = seconds;
        self
    }
}

/// Group entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub displayable: bool,
    pub default_graphic_unit: Option<i64>,
    pub note: String,
}

#[derive(Debug, Clone, Default)]
pub struct NewGroup {
    pub name: String,
    pub displayable: bool,
    pub default_graphic_unit: Option<i64>,
    pub note: String,
    /// Meters placed directly in the group
    pub meter_ids: Vec<i64>,
    /// Groups placed directly in the group
    pub child_group_ids: Vec<i64>,
}

impl NewGroup {
    pub fn new(name: &str, default_graphic_unit: Option<i64>) -> Self {
        Self {
            name: name.to_string(),
            displayable: true,
            default_graphic_unit,
            ..Default::default()
        }
    }

    pub fn with_meters(mut self, meter_ids: &[i64]) -> Self {
        self.meter_ids = meter_ids.to_vec();
        self
    }

    pub fn with_children(mut self, child_group_ids: &[i64]) -> Self {
        self.child_group_ids = child_group_ids.to_vec();
        self
    }
}
