//! Query parser - turns a free-text chart request into a structured query

use crate::config::ParserConfig;
use crate::error::Result;
use crate::extractors::{RuleTable, Vocabulary, DEFAULT_TIME_RANGE_PRESET};
use crate::matcher::{EntityMatcher, FuzzyEntityIndex, ACCEPTANCE_THRESHOLD};
use crate::types::{EntityDescriptor, ParsedQuery};
use ahash::AHashSet;
use tracing::{debug, trace};

/// Parser over a fixed entity set.
///
/// `parse` is a pure function of the input text and the entity index; it
/// never fails and can be called concurrently.
#[derive(Debug, Clone)]
pub struct QueryParser<M = FuzzyEntityIndex> {
    matcher: M,
    vocabulary: Vocabulary,
    acceptance_threshold: f64,
    min_candidate_chars: usize,
}

impl QueryParser<FuzzyEntityIndex> {
    /// Create a parser with the default fuzzy index and vocabulary
    pub fn new(entities: impl IntoIterator<Item = EntityDescriptor>) -> Self {
        Self::with_matcher(FuzzyEntityIndex::new(entities))
    }

    pub fn with_config(
        entities: impl IntoIterator<Item = EntityDescriptor>,
        config: &ParserConfig,
    ) -> Result<Self> {
        config.validate()?;
        let matcher =
            FuzzyEntityIndex::with_options(entities, config.weights, config.bitap_options())?;

        let custom = RuleTable::from_patterns(
            config
                .custom_time_ranges
                .iter()
                .map(|rule| (rule.pattern.as_str(), rule.preset.clone())),
        )?;
        let vocabulary = if custom.is_empty() {
            Vocabulary::builtin().clone()
        } else {
            Vocabulary::builtin().with_time_ranges(&custom)
        };

        Ok(Self {
            matcher,
            vocabulary,
            acceptance_threshold: config.acceptance_threshold,
            min_candidate_chars: config.min_candidate_chars,
        })
    }
}

impl<M: EntityMatcher> QueryParser<M> {
    /// Use any matcher implementation with the built-in vocabulary
    pub fn with_matcher(matcher: M) -> Self {
        Self {
            matcher,
            vocabulary: Vocabulary::builtin().clone(),
            acceptance_threshold: ACCEPTANCE_THRESHOLD,
            min_candidate_chars: 2,
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    /// Parse a free-text query.
    ///
    /// Unrecognised input degrades to defaults: no entities, a 24h preset,
    /// no chart type or aggregation.
    pub fn parse(&self, query: &str) -> ParsedQuery {
        let vocabulary = &self.vocabulary;

        let result = ParsedQuery {
            entity_ids: self.resolve_entities(query),
            time_range_preset: vocabulary
                .time_range(query)
                .filter(|preset| !preset.is_empty())
                .unwrap_or_else(|| DEFAULT_TIME_RANGE_PRESET.to_string()),
            chart_type: vocabulary.chart_type(query),
            aggregation: vocabulary.aggregation(query),
            stacked: vocabulary.is_stacked(query),
            comparison: vocabulary.is_comparison(query),
            raw_query: query.to_string(),
        };

        debug!(
            query,
            entities = ?result.entity_ids,
            preset = %result.time_range_preset,
            chart_type = ?result.chart_type,
            aggregation = ?result.aggregation,
            stacked = result.stacked,
            comparison = result.comparison,
            "Parsed chart query"
        );

        result
    }

    /// Entity-candidate phrases: comparison segments split on "and", with
    /// domain vocabulary stripped. Too-short phrases are dropped.
    pub fn candidate_phrases(&self, query: &str) -> Vec<String> {
        self.vocabulary
            .split_comparison(query)
            .into_iter()
            .flat_map(|segment| self.vocabulary.split_conjunction(segment))
            .map(|phrase| self.vocabulary.strip(phrase))
            .filter(|phrase| phrase.chars().count() >= self.min_candidate_chars)
            .collect()
    }

    /// Resolve candidate phrases to unique entity ids in first-seen order
    pub fn resolve_entities(&self, query: &str) -> Vec<String> {
        let mut seen: AHashSet<String> = AHashSet::new();
        let mut entity_ids = Vec::new();

        for phrase in self.candidate_phrases(query) {
            let Some(best) = self.matcher.best_match(&phrase) else {
                trace!(phrase = %phrase, "No entity candidates");
                continue;
            };

            if best.score >= self.acceptance_threshold {
                trace!(
                    phrase = %phrase,
                    entity = %best.entity.id,
                    score = best.score,
                    "Best match below acceptance, dropping phrase"
                );
                continue;
            }

            trace!(phrase = %phrase, entity = %best.entity.id, score = best.score, "Resolved entity");
            if seen.insert(best.entity.id.clone()) {
                entity_ids.push(best.entity.id.clone());
            }
        }

        entity_ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CustomTimeRange;
    use crate::matcher::ScoredEntity;
    use crate::types::{Aggregation, ChartType};

    fn household() -> Vec<EntityDescriptor> {
        vec![
            EntityDescriptor::new("sensor.power_usage", "Power Usage"),
            EntityDescriptor::new("sensor.energy_cost", "Energy Cost"),
            EntityDescriptor::new("sensor.temperature", "Temperature"),
            EntityDescriptor::new("sensor.humidity", "Humidity"),
            EntityDescriptor::new("sensor.grid_power", "Grid Power"),
            EntityDescriptor::new("sensor.solar_power", "Solar Power"),
        ]
    }

    fn parser() -> QueryParser {
        QueryParser::new(household())
    }

    #[test]
    fn test_time_ranges() {
        let parser = parser();

        assert_eq!(parser.parse("power usage last 7 days").time_range_preset, "7d");
        assert_eq!(parser.parse("show me power usage last 7 days").time_range_preset, "7d");
        assert_eq!(parser.parse("temperature last week").time_range_preset, "7d");
        assert_eq!(parser.parse("energy cost past 30 days").time_range_preset, "30d");
        assert_eq!(parser.parse("power usage yesterday").time_range_preset, "1d");
        assert_eq!(parser.parse("cost this month").time_range_preset, "30d");
        assert_eq!(parser.parse("power usage").time_range_preset, "24h");
    }

    #[test]
    fn test_single_entity() {
        let result = parser().parse("show me power usage");
        assert_eq!(result.entity_ids, vec!["sensor.power_usage"]);
    }

    #[test]
    fn test_multiple_entities_in_order() {
        let result = parser().parse("temperature and humidity");
        assert_eq!(result.entity_ids, vec!["sensor.temperature", "sensor.humidity"]);
        assert!(!result.comparison);
    }

    #[test]
    fn test_comparison() {
        let result = parser().parse("power usage vs cost");
        assert!(result.entity_ids.len() >= 2);
        assert_eq!(result.entity_ids, vec!["sensor.power_usage", "sensor.energy_cost"]);
        assert!(result.comparison);
    }

    #[test]
    fn test_comparison_across_segments_keeps_order() {
        let result = parser().parse("power usage versus energy cost compared to grid power");
        assert_eq!(
            result.entity_ids,
            vec!["sensor.power_usage", "sensor.energy_cost", "sensor.grid_power"]
        );
        assert!(result.comparison);
    }

    #[test]
    fn test_chart_types() {
        let parser = parser();

        assert_eq!(parser.parse("power usage as bar chart").chart_type, Some(ChartType::Bar));
        assert_eq!(parser.parse("show pie chart of power usage").chart_type, Some(ChartType::Pie));
        assert_eq!(parser.parse("power usage").chart_type, None);
    }

    #[test]
    fn test_aggregation() {
        let parser = parser();

        assert_eq!(parser.parse("daily power usage").aggregation, Some(Aggregation::Day));
        assert_eq!(parser.parse("hourly temperature").aggregation, Some(Aggregation::Hour));
        assert_eq!(parser.parse("temperature").aggregation, None);
    }

    #[test]
    fn test_stacked_entities_resolve() {
        let result = parser().parse("stack grid and solar power");
        assert!(result.stacked);
        assert_eq!(result.entity_ids, vec!["sensor.grid_power", "sensor.solar_power"]);
    }

    #[test]
    fn test_full_queries() {
        let parser = parser();

        let result = parser.parse("electricity cost last month");
        assert!(result.entity_ids.contains(&"sensor.energy_cost".to_string()));
        assert_eq!(result.time_range_preset, "30d");

        let result = parser.parse("temperature vs humidity this week");
        assert_eq!(result.entity_ids, vec!["sensor.temperature", "sensor.humidity"]);
        assert!(result.comparison);
        assert_eq!(result.time_range_preset, "7d");

        let result = parser.parse("daily power usage as bar chart");
        assert_eq!(result.entity_ids, vec!["sensor.power_usage"]);
        assert_eq!(result.chart_type, Some(ChartType::Bar));
        assert_eq!(result.aggregation, Some(Aggregation::Day));
        assert_eq!(result.raw_query, "daily power usage as bar chart");
    }

    #[test]
    fn test_duplicate_phrases_dedup() {
        let parser = parser();

        assert_eq!(parser.parse("power power usage").entity_ids, vec!["sensor.power_usage"]);
        assert_eq!(
            parser.parse("power usage vs power usage").entity_ids,
            vec!["sensor.power_usage"]
        );
    }

    #[test]
    fn test_misspelled_entities() {
        let result = parser().parse("temprature and humdity");
        assert_eq!(result.entity_ids, vec!["sensor.temperature", "sensor.humidity"]);
    }

    #[test]
    fn test_nonsense_degrades_to_defaults() {
        let parser = parser();

        for query in ["", "xyzzy", "!!!", "a", "   ", "a and b"] {
            let result = parser.parse(query);
            assert!(result.entity_ids.is_empty(), "query {:?}", query);
            assert_eq!(result.time_range_preset, "24h");
            assert_eq!(result.chart_type, None);
            assert_eq!(result.aggregation, None);
            assert!(!result.stacked);
            assert_eq!(result.raw_query, query);
        }
    }

    #[test]
    fn test_empty_entity_set() {
        let parser = QueryParser::new(Vec::new());
        let result = parser.parse("power usage last 7 days as bar chart");

        assert!(result.entity_ids.is_empty());
        assert_eq!(result.time_range_preset, "7d");
        assert_eq!(result.chart_type, Some(ChartType::Bar));
    }

    #[test]
    fn test_idempotent() {
        let parser = parser();
        let query = "stacked grid power and solar power vs cost last 3 days weekly";

        let first = parser.parse(query);
        let second = parser.parse(query);

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_candidate_phrases() {
        let phrases = parser().candidate_phrases("show me grid power and the solar power vs cost last week");
        assert_eq!(phrases, vec!["grid power", "solar power", "cost"]);
    }

    #[test]
    fn test_acceptance_threshold_from_config() {
        let config = ParserConfig {
            acceptance_threshold: 0.1,
            ..ParserConfig::default()
        };
        let parser = QueryParser::with_config(household(), &config).unwrap();

        // "cost" alone only partially matches "Energy Cost".
        let result = parser.parse("power usage vs cost");
        assert_eq!(result.entity_ids, vec!["sensor.power_usage"]);
    }

    #[test]
    fn test_custom_time_range_from_config() {
        let config = ParserConfig {
            custom_time_ranges: vec![CustomTimeRange {
                pattern: r"last\s+(\d+)\s+weeks?".to_string(),
                preset: "${1}w".to_string(),
            }],
            ..ParserConfig::default()
        };
        let parser = QueryParser::with_config(household(), &config).unwrap();
        let result = parser.parse("solar power last 2 weeks");

        assert_eq!(result.time_range_preset, "2w");
        assert_eq!(result.entity_ids, vec!["sensor.solar_power"]);
        assert_eq!(result.time_range().duration(), chrono::Duration::days(14));
    }

    #[test]
    fn test_invalid_custom_pattern() {
        let config = ParserConfig {
            custom_time_ranges: vec![CustomTimeRange {
                pattern: "last (".to_string(),
                preset: "1d".to_string(),
            }],
            ..ParserConfig::default()
        };
        assert!(QueryParser::with_config(household(), &config).is_err());
    }

    struct ExactMatcher(Vec<EntityDescriptor>);

    impl EntityMatcher for ExactMatcher {
        fn search(&self, phrase: &str) -> Vec<ScoredEntity<'_>> {
            self.0
                .iter()
                .filter(|e| e.display_name.as_deref() == Some(phrase))
                .map(|entity| ScoredEntity { entity, score: 0.0 })
                .collect()
        }
    }

    #[test]
    fn test_custom_matcher() {
        let parser = QueryParser::with_matcher(ExactMatcher(household()));
        let result = parser.parse("Humidity and humid");

        assert_eq!(result.entity_ids, vec!["sensor.humidity"]);
    }

    #[test]
    fn test_concurrent_parsing() {
        let parser = &parser();
        let expected = parser.parse("temperature vs humidity");

        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4)
                .map(|_| scope.spawn(move || parser.parse("temperature vs humidity")))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }
}
