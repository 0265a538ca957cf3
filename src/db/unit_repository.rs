//! Unit repository - units, entered conversions and the derived cik table

use sqlx::{Pool, Sqlite};

use crate::models::{Cik, Conversion, NewUnit, Unit};
use crate::utils::AppError;

const UNIT_COLUMNS: &str = "id, name, identifier, unit_represent, sec_in_rate, type_of_unit, \
                            suffix, displayable, preferred_display, note";

pub struct UnitRepository {
    pool: Pool<Sqlite>,
}

impl UnitRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Store a new unit
    pub async fn insert(&self, unit: &NewUnit) -> Result<Unit, AppError> {
        let stored = sqlx::query_as::<_, Unit>(&format!(
            r#"
            INSERT INTO units (name, identifier, unit_represent, sec_in_rate, type_of_unit,
                               suffix, displayable, preferred_display, note)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            UNIT_COLUMNS
        ))
        .bind(&unit.name)
        .bind(&unit.identifier)
        .bind(unit.unit_represent)
        .bind(unit.sec_in_rate)
        .bind(unit.type_of_unit)
        .bind(&unit.suffix)
        .bind(unit.displayable)
        .bind(unit.preferred_display)
        .bind(&unit.note)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Unit>, AppError> {
        let unit = sqlx::query_as::<_, Unit>(&format!(
            "SELECT {} FROM units WHERE id = ?",
            UNIT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(unit)
    }

    /// All units ordered by id
    pub async fn list_all(&self) -> Result<Vec<Unit>, AppError> {
        let units = sqlx::query_as::<_, Unit>(&format!(
            "SELECT {} FROM units ORDER BY id",
            UNIT_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(units)
    }

    pub async fn insert_conversion(&self, conversion: &Conversion) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO conversions (source_id, destination_id, bidirectional, slope, intercept, note)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(conversion.source_id)
        .bind(conversion.destination_id)
        .bind(conversion.bidirectional)
        .bind(conversion.slope)
        .bind(conversion.intercept)
        .bind(&conversion.note)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_conversions(&self) -> Result<Vec<Conversion>, AppError> {
        let conversions = sqlx::query_as::<_, Conversion>(
            r#"
            SELECT source_id, destination_id, bidirectional, slope, intercept, note
            FROM conversions
            ORDER BY source_id, destination_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(conversions)
    }

    /// Replace the whole cik table in one transaction
    pub async fn replace_cik(&self, rows: &[Cik]) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cik").execute(&mut *tx).await?;

        for row in rows {
            sqlx::query(
                "INSERT INTO cik (source_id, destination_id, slope, intercept) VALUES (?, ?, ?, ?)",
            )
            .bind(row.source_id)
            .bind(row.destination_id)
            .bind(row.slope)
            .bind(row.intercept)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Conversion from a meter unit to a graphic unit, if one exists
    pub async fn get_cik(
        &self,
        source_id: i64,
        destination_id: i64,
    ) -> Result<Option<Cik>, AppError> {
        let cik = sqlx::query_as::<_, Cik>(
            r#"
            SELECT source_id, destination_id, slope, intercept
            FROM cik
            WHERE source_id = ? AND destination_id = ?
            "#,
        )
        .bind(source_id)
        .bind(destination_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cik)
    }
}
