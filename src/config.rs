//! Parser configuration

use crate::error::{QueryError, Result};
use crate::matcher::{FieldWeights, ACCEPTANCE_THRESHOLD};
use crate::similarity::BitapOptions;
use serde::{Deserialize, Serialize};

/// An extra time-range rule. `preset` may reference captures as `${1}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomTimeRange {
    pub pattern: String,
    pub preset: String,
}

/// Configuration for query parsing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Best match scores strictly below this resolve to an entity
    pub acceptance_threshold: f64,
    /// Per-field fuzzy cutoff
    pub match_threshold: f64,
    /// Expected match position within a field
    pub location: usize,
    /// Drift from `location` that costs one full error
    pub distance: usize,
    pub weights: FieldWeights,
    /// Candidate phrases shorter than this (in characters) are skipped
    pub min_candidate_chars: usize,
    /// Evaluated before the built-in time-range rules
    pub custom_time_ranges: Vec<CustomTimeRange>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        let bitap = BitapOptions::default();
        Self {
            acceptance_threshold: ACCEPTANCE_THRESHOLD,
            match_threshold: bitap.threshold,
            location: bitap.location,
            distance: bitap.distance,
            weights: FieldWeights::default(),
            min_candidate_chars: 2,
            custom_time_ranges: Vec::new(),
        }
    }
}

impl ParserConfig {
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: ParserConfig = serde_json::from_str(raw)?;
        config.validate()?;
        tracing::info!(
            acceptance_threshold = config.acceptance_threshold,
            custom_time_ranges = config.custom_time_ranges.len(),
            "Loaded query parser config"
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.acceptance_threshold) {
            return Err(QueryError::InvalidConfig(format!(
                "acceptance_threshold must be within 0..=1, got {}",
                self.acceptance_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(QueryError::InvalidConfig(format!(
                "match_threshold must be within 0..=1, got {}",
                self.match_threshold
            )));
        }
        self.weights.validate()
    }

    pub fn bitap_options(&self) -> BitapOptions {
        BitapOptions {
            location: self.location,
            distance: self.distance,
            threshold: self.match_threshold,
        }
    }
}
