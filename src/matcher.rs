//! Entity matcher - weighted fuzzy lookup of known entities by id and names

use crate::error::{QueryError, Result};
use crate::similarity::{BitapOptions, BitapPattern};
use crate::types::EntityDescriptor;
use serde::{Deserialize, Serialize};

/// Best scores strictly below this resolve to an entity
pub const ACCEPTANCE_THRESHOLD: f64 = 0.65;

/// Relative weight of each indexed field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldWeights {
    pub id: f64,
    pub name: f64,
    pub alternate_name: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            id: 0.3,
            name: 0.5,
            alternate_name: 0.2,
        }
    }
}

impl FieldWeights {
    pub fn validate(&self) -> Result<()> {
        let weights = [self.id, self.name, self.alternate_name];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(QueryError::InvalidConfig(format!(
                "field weights must be finite and non-negative: {:?}",
                self
            )));
        }
        if weights.iter().sum::<f64>() <= 0.0 {
            return Err(QueryError::InvalidConfig(
                "field weights must not all be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Weights scaled to sum to one, in id/name/alternate order
    fn normalized(&self) -> [f64; 3] {
        let total = self.id + self.name + self.alternate_name;
        [self.id / total, self.name / total, self.alternate_name / total]
    }
}

/// An entity paired with its match distance (lower is better)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredEntity<'a> {
    pub entity: &'a EntityDescriptor,
    pub score: f64,
}

/// Ranked approximate lookup of entities by a free-text phrase.
///
/// Results are ordered best first; equal scores keep the order the
/// entities were indexed in.
pub trait EntityMatcher {
    fn search(&self, phrase: &str) -> Vec<ScoredEntity<'_>>;

    fn best_match(&self, phrase: &str) -> Option<ScoredEntity<'_>> {
        self.search(phrase).into_iter().next()
    }
}

#[derive(Debug, Clone)]
struct IndexedField {
    text: String,
    weight: f64,
    norm: f64,
}

#[derive(Debug, Clone)]
struct IndexedEntity {
    entity: EntityDescriptor,
    fields: Vec<IndexedField>,
}

/// Field-length norm: 1/sqrt(token count), rounded to three decimals
fn field_norm(text: &str) -> f64 {
    let tokens = text.split(' ').filter(|t| !t.is_empty()).count().max(1);
    let norm = 1.0 / (tokens as f64).sqrt();
    (norm * 1000.0).round() / 1000.0
}

/// Fuzzy index over a fixed entity set
#[derive(Debug, Clone)]
pub struct FuzzyEntityIndex {
    records: Vec<IndexedEntity>,
    options: BitapOptions,
}

impl FuzzyEntityIndex {
    pub fn new(entities: impl IntoIterator<Item = EntityDescriptor>) -> Self {
        Self::build(entities, FieldWeights::default(), BitapOptions::default())
    }

    pub fn with_options(
        entities: impl IntoIterator<Item = EntityDescriptor>,
        weights: FieldWeights,
        options: BitapOptions,
    ) -> Result<Self> {
        weights.validate()?;
        Ok(Self::build(entities, weights, options))
    }

    fn build(
        entities: impl IntoIterator<Item = EntityDescriptor>,
        weights: FieldWeights,
        options: BitapOptions,
    ) -> Self {
        let [id_weight, name_weight, alternate_weight] = weights.normalized();

        let records = entities
            .into_iter()
            .map(|entity| {
                let candidates = [
                    (Some(entity.id.as_str()), id_weight),
                    (entity.display_name.as_deref(), name_weight),
                    (entity.alternate_name.as_deref(), alternate_weight),
                ];
                let fields = candidates
                    .into_iter()
                    .filter_map(|(text, weight)| {
                        let text = text?;
                        if text.trim().is_empty() {
                            return None;
                        }
                        Some(IndexedField {
                            text: text.to_string(),
                            weight,
                            norm: field_norm(text),
                        })
                    })
                    .collect();
                IndexedEntity { entity, fields }
            })
            .collect();

        Self { records, options }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn entities(&self) -> impl Iterator<Item = &EntityDescriptor> {
        self.records.iter().map(|record| &record.entity)
    }
}

impl EntityMatcher for FuzzyEntityIndex {
    fn search(&self, phrase: &str) -> Vec<ScoredEntity<'_>> {
        let pattern = BitapPattern::new(phrase);

        let mut scored: Vec<ScoredEntity<'_>> = Vec::new();
        for record in &self.records {
            // Product of per-field distances; only matching fields take part.
            let mut total = 1.0;
            let mut matched = false;
            for field in &record.fields {
                let result = pattern.search_in(&field.text, &self.options);
                if !result.is_match {
                    continue;
                }
                matched = true;
                let base = if result.score == 0.0 && field.weight > 0.0 {
                    f64::EPSILON
                } else {
                    result.score
                };
                total *= base.powf(field.weight * field.norm);
            }

            if matched {
                scored.push(ScoredEntity {
                    entity: &record.entity,
                    score: total,
                });
            }
        }

        // Stable: ties keep index order.
        scored.sort_by(|a, b| a.score.total_cmp(&b.score));
        scored
    }
}
