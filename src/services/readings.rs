//! Readings aggregation engine
//!
//! Pure functions turning a meter's stored readings into the series shown on
//! line, bar, compare and 3D graphs. The HTTP layer loads readings and
//! conversions; nothing here touches the database.
//!
//! A reading contributes to a bucket in proportion to how much of its
//! duration overlaps the bucket. Quantity readings become rates per
//! `sec_in_rate` seconds of covered time; flow and raw readings are averaged
//! over covered time. The meter's cik is applied last.

use chrono::{Duration, NaiveDateTime};

use crate::config::ReadingsConfig;
use crate::models::{
    epoch_millis, BarReading, Cik, CompareReading, LineReading, Reading, Shift, ThreeDReadings,
    ThreeDSlot, TimeInterval, UnitRepresent,
};

pub const SECS_PER_HOUR: i64 = 3_600;
pub const SECS_PER_DAY: i64 = 86_400;

/// How one meter's readings map into the graphic unit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionContext {
    /// Representation of the meter's own unit
    pub represent: UnitRepresent,
    /// Rate period of the graphic unit
    pub sec_in_rate: i64,
    pub cik: Cik,
}

impl ConversionContext {
    pub fn is_quantity(&self) -> bool {
        self.represent == UnitRepresent::Quantity
    }

    /// Meters whose unit is `unused` have no graphable values
    pub fn is_graphable(&self) -> bool {
        self.represent != UnitRepresent::Unused
    }

    /// Converted value of one reading on its own
    fn reading_value(&self, reading: &Reading) -> f64 {
        let base = match self.represent {
            UnitRepresent::Quantity => {
                reading.reading * self.sec_in_rate as f64 / reading.duration_secs() as f64
            }
            _ => reading.reading,
        };
        self.cik.apply(base)
    }
}

/// Readings of one member meter of a group
#[derive(Debug, Clone)]
pub struct MemberReadings {
    pub readings: Vec<Reading>,
    pub ctx: ConversionContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Raw,
    Hourly,
    Daily,
}

/// Resolution of a meter line graph over `[start, end)`
pub fn meter_resolution(start: NaiveDateTime, end: NaiveDateTime, config: &ReadingsConfig) -> Resolution {
    let span = (end - start).num_seconds();
    if span >= config.min_day_points as i64 * SECS_PER_DAY {
        Resolution::Daily
    } else if span >= config.min_hour_points as i64 * SECS_PER_HOUR {
        Resolution::Hourly
    } else {
        Resolution::Raw
    }
}

/// Resolution of a group line graph; groups never use raw points
pub fn group_resolution(start: NaiveDateTime, end: NaiveDateTime, config: &ReadingsConfig) -> Resolution {
    let span = (end - start).num_seconds();
    if span >= config.min_day_points as i64 * SECS_PER_DAY {
        Resolution::Daily
    } else {
        Resolution::Hourly
    }
}

/// Equal-width buckets starting at `start`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub start: NaiveDateTime,
    pub width_secs: i64,
    pub count: usize,
}

impl Grid {
    /// The whole `width_secs` buckets inside `[start, end)`, aligned to
    /// multiples of `width_secs` since the epoch
    pub fn aligned(start: NaiveDateTime, end: NaiveDateTime, width_secs: i64) -> Option<Self> {
        let first = ceil_to(start, width_secs);
        let last = floor_to(end, width_secs);
        let count = (last - first).num_seconds() / width_secs;
        (count > 0).then_some(Self {
            start: first,
            width_secs,
            count: count as usize,
        })
    }

    /// Bars of `width_days` whole days ending at the last midnight before
    /// `end`. A partial leading bar is dropped.
    pub fn bars(start: NaiveDateTime, end: NaiveDateTime, width_days: u32) -> Option<Self> {
        let days = Self::aligned(start, end, SECS_PER_DAY)?;
        let bar_count = days.count / width_days as usize;
        if bar_count == 0 {
            return None;
        }
        let width_secs = width_days as i64 * SECS_PER_DAY;
        Some(Self {
            start: days.end() - Duration::seconds(width_secs * bar_count as i64),
            width_secs,
            count: bar_count,
        })
    }

    pub fn end(&self) -> NaiveDateTime {
        self.start + Duration::seconds(self.width_secs * self.count as i64)
    }

    pub fn bucket(&self, index: usize) -> (NaiveDateTime, NaiveDateTime) {
        let start = self.start + Duration::seconds(self.width_secs * index as i64);
        (start, start + Duration::seconds(self.width_secs))
    }

    /// Indexes of the buckets `[start, end)` touches
    fn index_range(&self, start: NaiveDateTime, end: NaiveDateTime) -> Option<(usize, usize)> {
        let total = self.width_secs * self.count as i64;
        let offset_start = (start - self.start).num_seconds();
        let offset_end = (end - self.start).num_seconds();
        if offset_end <= 0 || offset_start >= total {
            return None;
        }
        let first = offset_start.max(0).div_euclid(self.width_secs) as usize;
        let last = (offset_end - 1).div_euclid(self.width_secs) as usize;
        Some((first, last.min(self.count - 1)))
    }
}

fn truncate_subsec(ts: NaiveDateTime) -> NaiveDateTime {
    ts - Duration::nanoseconds(ts.and_utc().timestamp_subsec_nanos() as i64)
}

fn floor_to(ts: NaiveDateTime, width_secs: i64) -> NaiveDateTime {
    let ts = truncate_subsec(ts);
    let rem = ts.and_utc().timestamp().rem_euclid(width_secs);
    ts - Duration::seconds(rem)
}

fn ceil_to(ts: NaiveDateTime, width_secs: i64) -> NaiveDateTime {
    let floored = floor_to(ts, width_secs);
    if floored == ts {
        floored
    } else {
        floored + Duration::seconds(width_secs)
    }
}

fn overlap_secs(
    a_start: NaiveDateTime,
    a_end: NaiveDateTime,
    b_start: NaiveDateTime,
    b_end: NaiveDateTime,
) -> i64 {
    let start = a_start.max(b_start);
    let end = a_end.min(b_end);
    (end - start).num_seconds().max(0)
}

/// Earliest start and latest end over several reading sets
fn extent<'a>(sets: impl IntoIterator<Item = &'a [Reading]>) -> Option<(NaiveDateTime, NaiveDateTime)> {
    sets.into_iter()
        .flatten()
        .fold(None, |acc, r| match acc {
            None => Some((r.start_timestamp, r.end_timestamp)),
            Some((s, e)) => Some((s.min(r.start_timestamp), e.max(r.end_timestamp))),
        })
}

#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    /// Σ reading × overlap/duration for quantities, Σ reading × overlap otherwise
    weighted: f64,
    covered_secs: i64,
    min: f64,
    max: f64,
}

fn accumulate(readings: &[Reading], grid: &Grid, ctx: &ConversionContext) -> Vec<Accumulator> {
    let mut buckets = vec![Accumulator::default(); grid.count];

    for reading in readings {
        let duration = reading.duration_secs();
        if duration <= 0 {
            continue;
        }
        let Some((first, last)) = grid.index_range(reading.start_timestamp, reading.end_timestamp)
        else {
            continue;
        };
        let value = ctx.reading_value(reading);

        for (index, bucket) in buckets.iter_mut().enumerate().take(last + 1).skip(first) {
            let (bucket_start, bucket_end) = grid.bucket(index);
            let overlap = overlap_secs(
                reading.start_timestamp,
                reading.end_timestamp,
                bucket_start,
                bucket_end,
            );
            if overlap == 0 {
                continue;
            }

            bucket.weighted += match ctx.represent {
                UnitRepresent::Quantity => reading.reading * overlap as f64 / duration as f64,
                _ => reading.reading * overlap as f64,
            };
            if bucket.covered_secs == 0 {
                bucket.min = value;
                bucket.max = value;
            } else {
                bucket.min = bucket.min.min(value);
                bucket.max = bucket.max.max(value);
            }
            bucket.covered_secs += overlap;
        }
    }

    buckets
}

/// Converted value of each bucket, `None` where no reading covers it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BucketValue {
    pub value: f64,
    pub min: f64,
    pub max: f64,
}

pub fn bucket_values(readings: &[Reading], grid: &Grid, ctx: &ConversionContext) -> Vec<Option<BucketValue>> {
    if !ctx.is_graphable() {
        return vec![None; grid.count];
    }
    accumulate(readings, grid, ctx)
        .into_iter()
        .map(|bucket| {
            (bucket.covered_secs > 0).then(|| {
                let covered = bucket.covered_secs as f64;
                let base = match ctx.represent {
                    UnitRepresent::Quantity => bucket.weighted * ctx.sec_in_rate as f64 / covered,
                    _ => bucket.weighted / covered,
                };
                BucketValue {
                    value: ctx.cik.apply(base),
                    min: bucket.min,
                    max: bucket.max,
                }
            })
        })
        .collect()
}

fn line_points(grid: &Grid, values: Vec<Option<BucketValue>>) -> Vec<LineReading> {
    values
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| {
            let value = value?;
            let (start, end) = grid.bucket(index);
            Some(LineReading {
                reading: value.value,
                min: value.min,
                max: value.max,
                start_timestamp: epoch_millis(start),
                end_timestamp: epoch_millis(end),
            })
        })
        .collect()
}

fn resolution_width(resolution: Resolution) -> i64 {
    match resolution {
        Resolution::Daily => SECS_PER_DAY,
        _ => SECS_PER_HOUR,
    }
}

/// Line graph points of one meter
pub fn meter_line_readings(
    readings: &[Reading],
    interval: &TimeInterval,
    ctx: &ConversionContext,
    config: &ReadingsConfig,
) -> Vec<LineReading> {
    if !ctx.is_graphable() {
        return Vec::new();
    }
    let Some((start, end)) = extent([readings]).and_then(|(s, e)| interval.clamp(s, e)) else {
        return Vec::new();
    };

    match meter_resolution(start, end, config) {
        Resolution::Raw => readings
            .iter()
            .filter(|r| r.start_timestamp >= start && r.end_timestamp <= end)
            .map(|r| {
                let value = ctx.reading_value(r);
                LineReading {
                    reading: value,
                    min: value,
                    max: value,
                    start_timestamp: epoch_millis(r.start_timestamp),
                    end_timestamp: epoch_millis(r.end_timestamp),
                }
            })
            .collect(),
        resolution => match Grid::aligned(start, end, resolution_width(resolution)) {
            Some(grid) => line_points(&grid, bucket_values(readings, &grid, ctx)),
            None => Vec::new(),
        },
    }
}

/// Line graph points of a group: per-bucket sums over its meters
pub fn group_line_readings(
    members: &[MemberReadings],
    interval: &TimeInterval,
    config: &ReadingsConfig,
) -> Vec<LineReading> {
    if members.iter().any(|m| !m.ctx.is_graphable()) {
        return Vec::new();
    }
    let Some((start, end)) = extent(members.iter().map(|m| m.readings.as_slice()))
        .and_then(|(s, e)| interval.clamp(s, e))
    else {
        return Vec::new();
    };

    let width = resolution_width(group_resolution(start, end, config));
    let Some(grid) = Grid::aligned(start, end, width) else {
        return Vec::new();
    };

    let mut totals: Vec<Option<BucketValue>> = vec![None; grid.count];
    for member in members {
        let values = bucket_values(&member.readings, &grid, &member.ctx);
        for (total, value) in totals.iter_mut().zip(values) {
            let Some(value) = value else { continue };
            *total = Some(match total {
                Some(t) => BucketValue {
                    value: t.value + value.value,
                    min: t.min + value.min,
                    max: t.max + value.max,
                },
                None => value,
            });
        }
    }

    line_points(&grid, totals)
}

/// Converted quantity of each bar, `None` for bars without readings
fn bar_quantities(readings: &[Reading], grid: &Grid, ctx: &ConversionContext) -> Vec<Option<f64>> {
    accumulate(readings, grid, ctx)
        .into_iter()
        .map(|bucket| (bucket.covered_secs > 0).then(|| bucket.weighted * ctx.cik.slope))
        .collect()
}

fn bar_points(grid: &Grid, quantities: Vec<Option<f64>>) -> Vec<BarReading> {
    quantities
        .into_iter()
        .enumerate()
        .filter_map(|(index, quantity)| {
            let quantity = quantity?;
            let (start, end) = grid.bucket(index);
            Some(BarReading {
                reading: quantity,
                start_timestamp: epoch_millis(start),
                end_timestamp: epoch_millis(end),
            })
        })
        .collect()
}

/// Bar graph of one quantity meter
pub fn meter_bar_readings(
    readings: &[Reading],
    interval: &TimeInterval,
    bar_width_days: u32,
    ctx: &ConversionContext,
) -> Vec<BarReading> {
    if !ctx.is_quantity() || bar_width_days == 0 {
        return Vec::new();
    }
    let Some(grid) = extent([readings])
        .and_then(|(s, e)| interval.clamp(s, e))
        .and_then(|(s, e)| Grid::bars(s, e, bar_width_days))
    else {
        return Vec::new();
    };

    bar_points(&grid, bar_quantities(readings, &grid, ctx))
}

/// Bar graph of a group of quantity meters
pub fn group_bar_readings(
    members: &[MemberReadings],
    interval: &TimeInterval,
    bar_width_days: u32,
) -> Vec<BarReading> {
    if bar_width_days == 0 || members.iter().any(|m| !m.ctx.is_quantity()) {
        return Vec::new();
    }
    let Some(grid) = extent(members.iter().map(|m| m.readings.as_slice()))
        .and_then(|(s, e)| interval.clamp(s, e))
        .and_then(|(s, e)| Grid::bars(s, e, bar_width_days))
    else {
        return Vec::new();
    };

    let mut totals: Vec<Option<f64>> = vec![None; grid.count];
    for member in members {
        let quantities = bar_quantities(&member.readings, &grid, &member.ctx);
        for (total, quantity) in totals.iter_mut().zip(quantities) {
            if let Some(quantity) = quantity {
                *total = Some(total.unwrap_or(0.0) + quantity);
            }
        }
    }

    bar_points(&grid, totals)
}

/// Converted quantity used during `[start, end)`
pub fn quantity_usage(
    readings: &[Reading],
    start: NaiveDateTime,
    end: NaiveDateTime,
    ctx: &ConversionContext,
) -> f64 {
    let raw: f64 = readings
        .iter()
        .filter(|r| r.duration_secs() > 0)
        .map(|r| {
            let overlap = overlap_secs(r.start_timestamp, r.end_timestamp, start, end);
            r.reading * overlap as f64 / r.duration_secs() as f64
        })
        .sum();
    raw * ctx.cik.slope
}

/// The window `[curr_start, curr_end)` moved back by `shift`
pub fn previous_window(
    curr_start: NaiveDateTime,
    curr_end: NaiveDateTime,
    shift: &Shift,
) -> Option<(NaiveDateTime, NaiveDateTime)> {
    Some((shift.shift_back(curr_start)?, shift.shift_back(curr_end)?))
}

/// Current and previous usage of one quantity meter.
///
/// `curr` and `prev` are the readings overlapping each window.
pub fn compare_usage(
    curr: &[Reading],
    prev: &[Reading],
    curr_window: (NaiveDateTime, NaiveDateTime),
    prev_window: (NaiveDateTime, NaiveDateTime),
    ctx: &ConversionContext,
) -> Option<CompareReading> {
    ctx.is_quantity().then(|| CompareReading {
        curr_use: quantity_usage(curr, curr_window.0, curr_window.1, ctx),
        prev_use: quantity_usage(prev, prev_window.0, prev_window.1, ctx),
    })
}

/// 3D graph of one meter: one row per whole day, one column per
/// `reading_interval_hours` slot
pub fn meter_three_d_readings(
    readings: &[Reading],
    interval: &TimeInterval,
    reading_interval_hours: u32,
    ctx: &ConversionContext,
) -> ThreeDReadings {
    let slot_secs = reading_interval_hours as i64 * SECS_PER_HOUR;
    if !ctx.is_graphable() || slot_secs == 0 || SECS_PER_DAY % slot_secs != 0 {
        return ThreeDReadings::default();
    }

    let Some(days) = extent([readings])
        .and_then(|(s, e)| interval.clamp(s, e))
        .and_then(|(s, e)| Grid::aligned(s, e, SECS_PER_DAY))
    else {
        return ThreeDReadings::default();
    };

    let slots_per_day = (SECS_PER_DAY / slot_secs) as usize;
    let grid = Grid {
        start: days.start,
        width_secs: slot_secs,
        count: days.count * slots_per_day,
    };
    let values = bucket_values(readings, &grid, ctx);

    let x_data = (0..slots_per_day)
        .map(|slot| {
            let (start, end) = grid.bucket(slot);
            ThreeDSlot {
                start_timestamp: epoch_millis(start),
                end_timestamp: epoch_millis(end),
            }
        })
        .collect();
    let y_data = (0..days.count)
        .map(|day| epoch_millis(days.bucket(day).0))
        .collect();
    let z_data = values
        .chunks(slots_per_day)
        .map(|row| row.iter().map(|v| v.map(|v| v.value)).collect())
        .collect();

    ThreeDReadings {
        x_data,
        y_data,
        z_data,
    }
}
