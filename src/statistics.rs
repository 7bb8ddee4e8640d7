//! Statistics helpers for turning recorder rows into chart series

use crate::types::Aggregation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Units of cumulative meters (energy, gas, water)
const CUMULATIVE_UNITS: &[&str] = &["kWh", "Wh", "MWh", "m³", "ft³", "gal", "L"];

/// Which recorder statistic a series is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsType {
    State,
    Mean,
    Min,
    Max,
    Sum,
    /// Difference between consecutive readings
    Change,
}

impl StatisticsType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticsType::State => "state",
            StatisticsType::Mean => "mean",
            StatisticsType::Min => "min",
            StatisticsType::Max => "max",
            StatisticsType::Sum => "sum",
            StatisticsType::Change => "change",
        }
    }
}

/// One chart point, timestamp in milliseconds since the epoch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub timestamp: i64,
    pub value: f64,
}

/// A statistics row as returned by the host recorder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRow {
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub mean: Option<f64>,
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
    #[serde(default)]
    pub sum: Option<f64>,
    #[serde(default)]
    pub state: Option<f64>,
}

fn is_cumulative(unit: Option<&str>) -> bool {
    unit.is_some_and(|unit| CUMULATIVE_UNITS.contains(&unit))
}

/// Meters default to `Change`, everything else to `Mean`
pub fn default_statistics_type(unit: Option<&str>) -> StatisticsType {
    if is_cumulative(unit) {
        StatisticsType::Change
    } else {
        StatisticsType::Mean
    }
}

/// Meters default to daily grouping, everything else to hourly
pub fn default_grouping_period(unit: Option<&str>) -> Aggregation {
    if is_cumulative(unit) {
        Aggregation::Day
    } else {
        Aggregation::Hour
    }
}

/// Deltas between consecutive points, stamped with the later timestamp
pub fn calculate_change(points: &[DataPoint]) -> Vec<DataPoint> {
    points
        .windows(2)
        .map(|pair| DataPoint {
            timestamp: pair[1].timestamp,
            value: pair[1].value - pair[0].value,
        })
        .collect()
}

/// Pick the requested statistic from each row.
///
/// Missing values count as zero and NaN values are dropped. For `Change`
/// the state (or sum, or mean) is differenced.
pub fn extract_data_points(rows: &[StatisticsRow], statistics_type: StatisticsType) -> Vec<DataPoint> {
    let points: Vec<DataPoint> = rows
        .iter()
        .map(|row| {
            let value = match statistics_type {
                StatisticsType::Mean => row.mean,
                StatisticsType::Min => row.min,
                StatisticsType::Max => row.max,
                StatisticsType::Sum => row.sum,
                StatisticsType::State => row.state,
                StatisticsType::Change => row.state.or(row.sum).or(row.mean),
            };
            DataPoint {
                timestamp: row.start.timestamp_millis(),
                value: value.unwrap_or(0.0),
            }
        })
        .filter(|point| !point.value.is_nan())
        .collect();

    if statistics_type == StatisticsType::Change {
        calculate_change(&points)
    } else {
        points
    }
}
