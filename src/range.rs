//! Preset to concrete time range conversion

use crate::types::TimeRange;
use chrono::{DateTime, Duration, Months, Utc};
use regex::Regex;
use std::sync::OnceLock;

fn preset_regex() -> &'static Regex {
    static PRESET_REGEX: OnceLock<Regex> = OnceLock::new();
    PRESET_REGEX.get_or_init(|| {
        Regex::new(r"^(\d+)(h|d|w|m)$").expect("Invalid regex pattern - this is a bug")
    })
}

/// Convert a preset such as "7d" into a window ending now.
///
/// Malformed presets yield a zero-width `now..now` range.
pub fn preset_to_date_range(preset: &str) -> TimeRange {
    preset_to_date_range_at(preset, Utc::now())
}

/// Same as [`preset_to_date_range`] with an explicit "now".
///
/// Units: `h` hours, `d` days, `w` weeks, `m` calendar months. Month
/// subtraction clamps to the last day of a shorter month.
pub fn preset_to_date_range_at(preset: &str, now: DateTime<Utc>) -> TimeRange {
    let start = preset_start(preset, now).unwrap_or_else(|| {
        tracing::debug!(preset, "Unrecognised time range preset, using empty range");
        now
    });

    TimeRange { start, end: now }
}

fn preset_start(preset: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let captures = preset_regex().captures(preset)?;
    let value: u32 = captures.get(1)?.as_str().parse().ok()?;
    let unit = captures.get(2)?.as_str();

    match unit {
        "h" => now.checked_sub_signed(Duration::try_hours(i64::from(value))?),
        "d" => now.checked_sub_signed(Duration::try_days(i64::from(value))?),
        "w" => now.checked_sub_signed(Duration::try_weeks(i64::from(value))?),
        "m" => now.checked_sub_months(Months::new(value)),
        _ => None,
    }
}
