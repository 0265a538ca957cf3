//! Meter and group repositories

use sqlx::{Pool, Sqlite};

use crate::models::{Group, Meter, NewGroup, NewMeter};
use crate::utils::AppError;

const METER_COLUMNS: &str = "id, name, identifier, unit_id, default_graphic_unit, enabled, \
                             displayable, reading_frequency, note";

pub struct MeterRepository {
    pool: Pool<Sqlite>,
}

impl MeterRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, meter: &NewMeter) -> Result<Meter, AppError> {
        let stored = sqlx::query_as::<_, Meter>(&format!(
            r#"
            INSERT INTO meters (name, identifier, unit_id, default_graphic_unit, enabled,
                                displayable, reading_frequency, note)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING {}
            "#,
            METER_COLUMNS
        ))
        .bind(&meter.name)
        .bind(&meter.identifier)
        .bind(meter.unit_id)
        .bind(meter.default_graphic_unit)
        .bind(meter.enabled)
        .bind(meter.displayable)
        .bind(meter.reading_frequency)
        .bind(&meter.note)
        .fetch_one(&self.pool)
        .await?;

        Ok(stored)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Meter>, AppError> {
        let meter = sqlx::query_as::<_, Meter>(&format!(
            "SELECT {} FROM meters WHERE id = ?",
            METER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(meter)
    }
}

pub struct GroupRepository {
    pool: Pool<Sqlite>,
}

impl GroupRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Store a group together with its immediate meters and child groups
    pub async fn insert(&self, group: &NewGroup) -> Result<Group, AppError> {
        let mut tx = self.pool.begin().await?;

        let stored = sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (name, displayable, default_graphic_unit, note)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, displayable, default_graphic_unit, note
            "#,
        )
        .bind(&group.name)
        .bind(group.displayable)
        .bind(group.default_graphic_unit)
        .bind(&group.note)
        .fetch_one(&mut *tx)
        .await?;

        for meter_id in &group.meter_ids {
            sqlx::query("INSERT INTO groups_immediate_meters (group_id, meter_id) VALUES (?, ?)")
                .bind(stored.id)
                .bind(meter_id)
                .execute(&mut *tx)
                .await?;
        }

        for child_id in &group.child_group_ids {
            sqlx::query(
                "INSERT INTO groups_immediate_children (parent_id, child_id) VALUES (?, ?)",
            )
            .bind(stored.id)
            .bind(child_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(stored)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<Group>, AppError> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, name, displayable, default_graphic_unit, note FROM groups WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    /// Every meter in the group or any group nested below it
    pub async fn deep_meter_ids(&self, group_id: i64) -> Result<Vec<i64>, AppError> {
        // UNION (not UNION ALL) stops the recursion on cyclic nesting
        let ids = sqlx::query_scalar::<_, i64>(
            r#"
            WITH RECURSIVE descendants(id) AS (
                SELECT ?
                UNION
                SELECT c.child_id
                FROM groups_immediate_children c
                INNER JOIN descendants d ON c.parent_id = d.id
            )
            SELECT DISTINCT gm.meter_id
            FROM groups_immediate_meters gm
            INNER JOIN descendants d ON gm.group_id = d.id
            ORDER BY gm.meter_id
            "#,
        )
        .bind(group_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }
}
