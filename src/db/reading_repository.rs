//! Reading repository
//!
//! Timestamps are stored as epoch seconds of the wall-clock time.

use chrono::{DateTime, NaiveDateTime};
use sqlx::{Pool, Sqlite};

use crate::models::Reading;
use crate::utils::AppError;

type ReadingRow = (i64, f64, i64, i64);

pub struct ReadingRepository {
    pool: Pool<Sqlite>,
}

impl ReadingRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Insert readings in one transaction
    pub async fn insert_many(&self, readings: &[Reading]) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;

        for reading in readings {
            if reading.end_timestamp <= reading.start_timestamp {
                return Err(AppError::bad_request(format!(
                    "Reading for meter {} ends before it starts at {}",
                    reading.meter_id, reading.start_timestamp
                )));
            }

            inserted += sqlx::query(
                r#"
                INSERT INTO readings (meter_id, reading, start_timestamp, end_timestamp)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(reading.meter_id)
            .bind(reading.reading)
            .bind(to_epoch(reading.start_timestamp))
            .bind(to_epoch(reading.end_timestamp))
            .execute(&mut *tx)
            .await?
            .rows_affected();
        }

        tx.commit().await?;
        Ok(inserted)
    }

    /// Readings of a meter overlapping `[start, end)`, ordered by start.
    /// `None` leaves that side open.
    pub async fn overlapping(
        &self,
        meter_id: i64,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<Reading>, AppError> {
        let rows = sqlx::query_as::<_, ReadingRow>(
            r#"
            SELECT meter_id, reading, start_timestamp, end_timestamp
            FROM readings
            WHERE meter_id = ? AND end_timestamp > ? AND start_timestamp < ?
            ORDER BY start_timestamp
            "#,
        )
        .bind(meter_id)
        .bind(start.map_or(i64::MIN, to_epoch))
        .bind(end.map_or(i64::MAX, to_epoch))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(row_to_reading).collect()
    }
}

fn to_epoch(ts: NaiveDateTime) -> i64 {
    ts.and_utc().timestamp()
}

fn from_epoch(secs: i64) -> Result<NaiveDateTime, AppError> {
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| AppError::internal(format!("Stored timestamp out of range: {}", secs)))
}

fn row_to_reading((meter_id, reading, start, end): ReadingRow) -> Result<Reading, AppError> {
    Ok(Reading::new(meter_id, reading, from_epoch(start)?, from_epoch(end)?))
}
