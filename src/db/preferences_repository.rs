//! Preferences repository - the single preferences row

use sqlx::{Pool, Sqlite};

use crate::models::Preferences;
use crate::utils::AppError;

pub struct PreferencesRepository {
    pool: Pool<Sqlite>,
}

impl PreferencesRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn get(&self) -> Result<Preferences, AppError> {
        let preferences = sqlx::query_as::<_, Preferences>(
            r#"
            SELECT display_title, default_chart_to_render, default_bar_stacking, default_language,
                   default_timezone, default_warning_file_size, default_file_size_limit,
                   default_area_normalization, default_area_unit, default_meter_reading_frequency,
                   default_help_url, default_graphic_unit
            FROM preferences
            WHERE id = 1
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(preferences)
    }

    pub async fn update(&self, preferences: &Preferences) -> Result<Preferences, AppError> {
        sqlx::query(
            r#"
            UPDATE preferences SET
                display_title = ?,
                default_chart_to_render = ?,
                default_bar_stacking = ?,
                default_language = ?,
                default_timezone = ?,
                default_warning_file_size = ?,
                default_file_size_limit = ?,
                default_area_normalization = ?,
                default_area_unit = ?,
                default_meter_reading_frequency = ?,
                default_help_url = ?,
                default_graphic_unit = ?
            WHERE id = 1
            "#,
        )
        .bind(&preferences.display_title)
        .bind(preferences.default_chart_to_render)
        .bind(preferences.default_bar_stacking)
        .bind(preferences.default_language)
        .bind(&preferences.default_timezone)
        .bind(preferences.default_warning_file_size)
        .bind(preferences.default_file_size_limit)
        .bind(preferences.default_area_normalization)
        .bind(preferences.default_area_unit)
        .bind(preferences.default_meter_reading_frequency)
        .bind(&preferences.default_help_url)
        .bind(preferences.default_graphic_unit)
        .execute(&self.pool)
        .await?;

        self.get().await
    }
}
