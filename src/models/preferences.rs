//! Site-wide preferences

use serde::{Deserialize, Deserializer, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "camelCase")]
#[sqlx(rename_all = "camelCase")]
pub enum ChartType {
    Line,
    Bar,
    Compare,
    Map,
    Radar,
    ThreeD,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Language {
    En,
    Fr,
    Es,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum AreaUnit {
    Meters,
    Feet,
    None,
}

/// Stored preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub display_title: String,
    pub default_chart_to_render: ChartType,
    pub default_bar_stacking: bool,
    pub default_language: Language,
    pub default_timezone: Option<String>,
    /// Megabytes
    pub default_warning_file_size: f64,
    /// Megabytes
    pub default_file_size_limit: f64,
    pub default_area_normalization: bool,
    pub default_area_unit: AreaUnit,
    /// Seconds
    pub default_meter_reading_frequency: i64,
    pub default_help_url: String,
    pub default_graphic_unit: Option<i64>,
}

/// A field that is present in the JSON body, possibly as `null`
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update; absent fields keep their stored value. `null` clears
/// the nullable fields.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePreferences {
    #[validate(length(max = 100))]
    pub display_title: Option<String>,
    pub default_chart_to_render: Option<ChartType>,
    pub default_bar_stacking: Option<bool>,
    pub default_language: Option<Language>,
    #[serde(default, deserialize_with = "present")]
    #[validate(length(min = 1, max = 64))]
    pub default_timezone: Option<Option<String>>,
    #[validate(range(min = 0.0))]
    pub default_warning_file_size: Option<f64>,
    #[validate(range(min = 0.0))]
    pub default_file_size_limit: Option<f64>,
    pub default_area_normalization: Option<bool>,
    pub default_area_unit: Option<AreaUnit>,
    #[validate(range(min = 1))]
    pub default_meter_reading_frequency: Option<i64>,
    #[validate(length(max = 2048))]
    pub default_help_url: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub default_graphic_unit: Option<Option<i64>>,
}

/// Body of `POST /api/preferences`
#[derive(Debug, Clone, Deserialize)]
pub struct PreferencesRequest {
    pub preferences: UpdatePreferences,
}

impl Preferences {
    /// Apply an update, checking constraints that span several fields
    pub fn merged(&self, update: UpdatePreferences) -> Result<Self, String> {
        let merged = Self {
            display_title: update.display_title.unwrap_or_else(|| self.display_title.clone()),
            default_chart_to_render: update
                .default_chart_to_render
                .unwrap_or(self.default_chart_to_render),
            default_bar_stacking: update
                .default_bar_stacking
                .unwrap_or(self.default_bar_stacking),
            default_language: update.default_language.unwrap_or(self.default_language),
            default_timezone: update
                .default_timezone
                .unwrap_or_else(|| self.default_timezone.clone()),
            default_warning_file_size: update
                .default_warning_file_size
                .unwrap_or(self.default_warning_file_size),
            default_file_size_limit: update
                .default_file_size_limit
                .unwrap_or(self.default_file_size_limit),
            default_area_normalization: update
                .default_area_normalization
                .unwrap_or(self.default_area_normalization),
            default_area_unit: update.default_area_unit.unwrap_or(self.default_area_unit),
            default_meter_reading_frequency: update
                .default_meter_reading_frequency
                .unwrap_or(self.default_meter_reading_frequency),
            default_help_url: update
                .default_help_url
                .unwrap_or_else(|| self.default_help_url.clone()),
            default_graphic_unit: update
                .default_graphic_unit
                .unwrap_or(self.default_graphic_unit),
        };

        if merged.default_warning_file_size > merged.default_file_size_limit {
            return Err("defaultWarningFileSize cannot exceed defaultFileSizeLimit".to_string());
        }

        Ok(merged)
    }
}
