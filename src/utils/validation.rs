//! Input validation utilities

use once_cell::sync::Lazy;
use regex::Regex;

/// Comma-separated list of positive integer ids, e.g. `1,2,17`
static ID_LIST_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[1-9][0-9]*(,[1-9][0-9]*)*$").unwrap());

static USERNAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9._@+-]*$").unwrap());

/// Hours allowed as a 3D reading interval
pub const READING_INTERVAL_HOURS: [u32; 8] = [1, 2, 3, 4, 6, 8, 12, 24];

/// Parse a path segment such as `1,2,3` into ids, preserving order and
/// dropping duplicates
pub fn parse_id_list(raw: &str) -> Option<Vec<i64>> {
    if raw.len() > 1024 || !ID_LIST_REGEX.is_match(raw) {
        return None;
    }

    let mut ids: Vec<i64> = Vec::new();
    for part in raw.split(',') {
        let id = part.parse::<i64>().ok()?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Some(ids)
}

/// Validate a login name
pub fn validate_username(username: &str) -> bool {
    !username.is_empty() && username.len() <= 254 && USERNAME_REGEX.is_match(username)
}

/// Validate a 3D reading interval in hours
pub fn validate_reading_interval(hours: u32) -> bool {
    READING_INTERVAL_HOURS.contains(&hours)
}
