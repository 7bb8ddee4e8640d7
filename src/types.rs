//! Core data types for query parsing results

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A known sensor entity supplied by the host's entity registry.
///
/// Field names follow the registry records so a registry listing can be
/// deserialized directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    #[serde(rename = "entity_id", alias = "id")]
    pub id: String,
    #[serde(rename = "name", alias = "display_name", default)]
    pub display_name: Option<String>,
    #[serde(rename = "original_name", alias = "alternate_name", default)]
    pub alternate_name: Option<String>,
}

impl EntityDescriptor {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: Some(display_name.into()),
            alternate_name: None,
        }
    }

    pub fn with_alternate_name(mut self, alternate_name: impl Into<String>) -> Self {
        self.alternate_name = Some(alternate_name.into());
        self
    }
}

/// Chart types a query can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Line,
    Bar,
    Area,
    Pie,
    Scatter,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
            ChartType::Area => "area",
            ChartType::Pie => "pie",
            ChartType::Scatter => "scatter",
        }
    }

    /// Line, bar and area can be assigned per axis; pie and scatter
    /// describe the whole chart.
    pub fn is_series_type(&self) -> bool {
        matches!(self, ChartType::Line | ChartType::Bar | ChartType::Area)
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grouping period applied to raw readings before charting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Hour,
    Day,
    Week,
    Month,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Hour => "hour",
            Aggregation::Day => "day",
            Aggregation::Week => "week",
            Aggregation::Month => "month",
        }
    }

    /// Period name understood by the host's statistics recorder
    pub fn statistics_period(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured result of parsing a free-text chart query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Resolved entity ids, unique, in first-seen order
    pub entity_ids: Vec<String>,
    pub time_range_preset: String,
    pub chart_type: Option<ChartType>,
    pub aggregation: Option<Aggregation>,
    pub stacked: bool,
    pub comparison: bool,
    pub raw_query: String,
}

impl ParsedQuery {
    /// Resolve the preset against the current time
    pub fn time_range(&self) -> TimeRange {
        crate::range::preset_to_date_range(&self.time_range_preset)
    }
}

/// Concrete time window derived from a preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// A zero-width range carries no meaningful window; callers
    /// substitute their own default.
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}
