//! Unit and conversion models

use serde::{Deserialize, Serialize};

/// How readings in a unit relate to time
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UnitRepresent {
    /// Consumed amount over the reading period, e.g. kWh
    Quantity,
    /// Rate over the reading period, e.g. kW
    Flow,
    /// Instantaneous value, e.g. temperature
    Raw,
    Unused,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum UnitType {
    Unit,
    Meter,
    Suffix,
}

/// Who may see a unit, meter or group
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Displayable {
    None,
    All,
    Admin,
}

/// Unit entity
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: i64,
    pub name: String,
    pub identifier: String,
    pub unit_represent: UnitRepresent,
    pub sec_in_rate: i64,
    pub type_of_unit: UnitType,
    pub suffix: String,
    pub displayable: Displayable,
    pub preferred_display: bool,
    pub note: String,
}

/// Values for a unit that has not been stored yet
#[derive(Debug, Clone)]
pub struct NewUnit {
    pub name: String,
    pub identifier: String,
    pub unit_represent: UnitRepresent,
    pub sec_in_rate: i64,
    pub type_of_unit: UnitType,
    pub suffix: String,
    pub displayable: Displayable,
    pub preferred_display: bool,
    pub note: String,
}

impl NewUnit {
    /// A unit with an hourly rate, visible to everyone
    pub fn new(name: &str, unit_represent: UnitRepresent, type_of_unit: UnitType) -> Self {
        Self {
            name: name.to_string(),
            identifier: name.to_string(),
            unit_represent,
            sec_in_rate: 3600,
            type_of_unit,
            suffix: String::new(),
            displayable: match type_of_unit {
                UnitType::Meter => Displayable::None,
                _ => Displayable::All,
            },
            preferred_display: false,
            note: String::new(),
        }
    }

    pub fn with_displayable(mut self, displayable: Displayable) -> Self {
        self.displayable = displayable;
        self
    }

    pub fn with_sec_in_rate(mut self, sec_in_rate: i64) -> Self {
        self.sec_in_rate = sec_in_rate;
        self
    }
}

/// Conversion entered between two units
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Conversion {
    pub source_id: i64,
    pub destination_id: i64,
    pub bidirectional: bool,
    pub slope: f64,
    pub intercept: f64,
    pub note: String,
}

/// Derived conversion from a meter unit to a graphable unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Cik {
    pub source_id: i64,
    pub destination_id: i64,
    pub slope: f64,
    pub intercept: f64,
}

impl Cik {
    pub fn apply(&self, value: f64) -> f64 {
        value * self.slope + self.intercept
    }
}
