//! Time intervals and compare shifts as they appear in query strings

use chrono::{DateTime, Duration, Months, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

/// A possibly open-ended interval `[start, end)`
///
/// The query-string form is `all` for the unbounded interval, otherwise
/// `START_END` where either side may be empty, `-inf` or `inf`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeInterval {
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
}

impl TimeInterval {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Intersect with `[extent_start, extent_end)`. `None` when empty.
    pub fn clamp(
        &self,
        extent_start: NaiveDateTime,
        extent_end: NaiveDateTime,
    ) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.start.map_or(extent_start, |s| s.max(extent_start));
        let end = self.end.map_or(extent_end, |e| e.min(extent_end));
        (start < end).then_some((start, end))
    }
}

impl std::fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.start.is_none() && self.end.is_none() {
            return write!(f, "all");
        }
        let fmt_side = |ts: Option<NaiveDateTime>, open: &str| match ts {
            Some(ts) => ts.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
            None => open.to_string(),
        };
        write!(
            f,
            "{}_{}",
            fmt_side(self.start, "-inf"),
            fmt_side(self.end, "inf")
        )
    }
}

impl std::str::FromStr for TimeInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "all" {
            return Ok(Self::unbounded());
        }

        let (start, end) = s
            .split_once('_')
            .ok_or_else(|| format!("Invalid time interval: {}", s))?;

        let parse_side = |side: &str| -> Result<Option<NaiveDateTime>, String> {
            match side {
                "" | "-inf" | "inf" | "-infinity" | "infinity" => Ok(None),
                other => parse_datetime(other)
                    .map(Some)
                    .ok_or_else(|| format!("Invalid timestamp in time interval: {}", other)),
            }
        };

        let interval = Self {
            start: parse_side(start)?,
            end: parse_side(end)?,
        };

        if let (Some(start), Some(end)) = (interval.start, interval.end) {
            if start > end {
                return Err(format!("Time interval starts after it ends: {}", s));
            }
        }

        Ok(interval)
    }
}

/// Parse an ISO-8601 date-time, with or without an offset. Offsets are
/// folded into UTC wall-clock time.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Some(dt);
        }
    }
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^P(?:(\d+)Y)?(?:(\d+)M)?(?:(\d+)W)?(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?)?$",
    )
    .unwrap()
});

/// How far back the previous window of a compare graph lies, as an ISO-8601
/// duration such as `P1D`, `P7D`, `P28D` or `P1M`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shift {
    pub months: u32,
    pub duration: Duration,
}

impl Shift {
    /// Move a timestamp back by this shift. Calendar months are applied first.
    pub fn shift_back(&self, ts: NaiveDateTime) -> Option<NaiveDateTime> {
        let ts = ts.checked_sub_months(Months::new(self.months))?;
        ts.checked_sub_signed(self.duration)
    }
}

impl std::str::FromStr for Shift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid shift duration: {}", s);
        let caps = DURATION_REGEX.captures(s).ok_or_else(invalid)?;
        if s.ends_with('T') || caps.iter().skip(1).all(|c| c.is_none()) {
            return Err(invalid());
        }

        let field = |i: usize| -> Result<i64, String> {
            caps.get(i)
                .map_or(Ok(0), |m| m.as_str().parse::<i64>().map_err(|_| invalid()))
        };

        let years = field(1)?;
        let months = field(2)?;
        let weeks = field(3)?;
        let days = field(4)?;
        let hours = field(5)?;
        let minutes = field(6)?;
        let seconds = field(7)?;

        let months = u32::try_from(years * 12 + months).map_err(|_| invalid())?;
        let duration = [
            Duration::try_weeks(weeks),
            Duration::try_days(days),
            Duration::try_hours(hours),
            Duration::try_minutes(minutes),
            Duration::try_seconds(seconds),
        ]
        .into_iter()
        .try_fold(Duration::zero(), |total, part| total.checked_add(&part?))
        .ok_or_else(invalid)?;

        Ok(Self { months, duration })
    }
}
