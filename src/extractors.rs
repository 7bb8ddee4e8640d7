//! Ordered pattern tables for time ranges, chart types, aggregation and modifiers
//!
//! Every table is an explicit list evaluated top to bottom; the first rule
//! that matches wins. All patterns are case-insensitive.

use crate::error::Result;
use crate::types::{Aggregation, ChartType};
use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

/// Preset used when no time-range rule matches
pub const DEFAULT_TIME_RANGE_PRESET: &str = "24h";

const TIME_RANGE_RULES: &[(&str, &str)] = &[
    (r"last\s+(\d+)\s+days?", "${1}d"),
    (r"past\s+(\d+)\s+days?", "${1}d"),
    (r"last\s+(\d+)\s+hours?", "${1}h"),
    (r"last\s+week", "7d"),
    (r"this\s+week", "7d"),
    (r"last\s+month", "30d"),
    (r"this\s+month", "30d"),
    (r"yesterday", "1d"),
    (r"today", "24h"),
    (r"last\s+24\s+hours?", "24h"),
];

const CHART_TYPE_RULES: &[(&str, ChartType)] = &[
    (r"bar\s+chart|as\s+bar", ChartType::Bar),
    (r"line\s+chart|as\s+line", ChartType::Line),
    (r"area\s+chart|as\s+area", ChartType::Area),
    (r"pie\s+chart|as\s+pie", ChartType::Pie),
    (r"scatter|correlation", ChartType::Scatter),
];

const AGGREGATION_RULES: &[(&str, Aggregation)] = &[
    (r"hourly|per\s+hour", Aggregation::Hour),
    (r"daily|per\s+day", Aggregation::Day),
    (r"weekly|per\s+week", Aggregation::Week),
    (r"monthly|per\s+month", Aggregation::Month),
];

const STACKED_PATTERN: &str = r"stack(?:ed)?";
const COMPARISON_PATTERN: &str =
    r"\s+vs\.?\s+|\s+versus\s+|\s+compared\s+to\s+|\s+against\s+";
const CONJUNCTION_PATTERN: &str = r"\s+and\s+";

/// Phrases removed from an entity candidate, with their replacement
const CLEANUP_RULES: &[(&str, &str)] = &[
    (r"last\s+\d+\s+\w+", ""),
    (r"past\s+\d+\s+\w+", ""),
    (r"last\s+(?:week|month|year|hour|day)", ""),
    (r"this\s+(?:week|month|year|hour|day)", ""),
    (r"yesterday|today", ""),
    (r"as\s+\w+\s+chart", ""),
    (r"\b(?:bar|line|area|pie|scatter)\s+chart\b", ""),
    (r"\bas\s+(?:bar|line|area|pie|scatter)\b", ""),
    (r"\b(?:scatter|correlation)\b", ""),
    (r"\bper\s+(?:hour|day|week|month)\b", ""),
    (r"\b(?:hourly|daily|weekly|monthly)\b", ""),
    (r"\b(?:stack(?:ed)?|show|me|the|or|of)\b", " "),
];

fn compile(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

/// A single pattern and the value it signals
#[derive(Debug, Clone)]
pub struct Rule<T> {
    pub pattern: Regex,
    pub value: T,
}

/// Ordered list of rules; earlier rules take precedence
#[derive(Debug, Clone)]
pub struct RuleTable<T> {
    rules: Vec<Rule<T>>,
}

impl<T> Default for RuleTable<T> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<T: Clone> RuleTable<T> {
    pub fn from_patterns<'a>(entries: impl IntoIterator<Item = (&'a str, T)>) -> Result<Self> {
        let mut table = Self::default();
        for (pattern, value) in entries {
            table.push(pattern, value)?;
        }
        Ok(table)
    }

    /// Append a rule with the lowest precedence so far
    pub fn push(&mut self, pattern: &str, value: T) -> Result<()> {
        self.rules.push(Rule {
            pattern: compile(pattern)?,
            value,
        });
        Ok(())
    }

    /// Rules of `other` take precedence over the rules of `self`
    pub fn preceded_by(&self, other: &RuleTable<T>) -> RuleTable<T> {
        let mut rules = other.rules.clone();
        rules.extend(self.rules.iter().cloned());
        RuleTable { rules }
    }

    pub fn rules(&self) -> &[Rule<T>] {
        &self.rules
    }

    pub fn first_match(&self, text: &str) -> Option<&Rule<T>> {
        self.rules.iter().find(|rule| rule.pattern.is_match(text))
    }

    pub fn find(&self, text: &str) -> Option<T> {
        self.first_match(text).map(|rule| rule.value.clone())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl RuleTable<String> {
    /// First matching rule's preset template with `${n}` captures expanded
    pub fn expand(&self, text: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| {
            let captures = rule.pattern.captures(text)?;
            let mut preset = String::new();
            captures.expand(&rule.value, &mut preset);
            Some(preset)
        })
    }
}

/// The full domain vocabulary: extraction tables plus the phrase cleanup list
#[derive(Debug, Clone)]
pub struct Vocabulary {
    time_ranges: RuleTable<String>,
    chart_types: RuleTable<ChartType>,
    aggregations: RuleTable<Aggregation>,
    stacked: Regex,
    comparison: Regex,
    conjunction: Regex,
    cleanup: Vec<(Regex, String)>,
    whitespace: Regex,
}

impl Vocabulary {
    /// Shared built-in vocabulary
    pub fn builtin() -> &'static Vocabulary {
        static BUILTIN: OnceLock<Vocabulary> = OnceLock::new();
        BUILTIN.get_or_init(|| {
            Self::compile_builtin().expect("Invalid built-in vocabulary pattern - this is a bug")
        })
    }

    fn compile_builtin() -> Result<Self> {
        let cleanup = CLEANUP_RULES
            .iter()
            .map(|(pattern, replacement)| -> Result<(Regex, String)> {
                Ok((compile(pattern)?, replacement.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            time_ranges: RuleTable::from_patterns(
                TIME_RANGE_RULES
                    .iter()
                    .map(|(pattern, preset)| (*pattern, preset.to_string())),
            )?,
            chart_types: RuleTable::from_patterns(CHART_TYPE_RULES.iter().copied())?,
            aggregations: RuleTable::from_patterns(AGGREGATION_RULES.iter().copied())?,
            stacked: compile(STACKED_PATTERN)?,
            comparison: compile(COMPARISON_PATTERN)?,
            conjunction: compile(CONJUNCTION_PATTERN)?,
            cleanup,
            whitespace: Regex::new(r"\s+")?,
        })
    }

    /// Add time-range rules ahead of the existing ones. Their patterns are
    /// also stripped from entity candidates.
    pub fn with_time_ranges(&self, custom: &RuleTable<String>) -> Vocabulary {
        let mut vocabulary = self.clone();
        vocabulary.time_ranges = self.time_ranges.preceded_by(custom);

        let mut cleanup: Vec<(Regex, String)> = custom
            .rules()
            .iter()
            .map(|rule| (rule.pattern.clone(), String::new()))
            .collect();
        cleanup.extend(self.cleanup.iter().cloned());
        vocabulary.cleanup = cleanup;
        vocabulary
    }

    pub fn time_ranges(&self) -> &RuleTable<String> {
        &self.time_ranges
    }

    pub fn chart_types(&self) -> &RuleTable<ChartType> {
        &self.chart_types
    }

    pub fn aggregations(&self) -> &RuleTable<Aggregation> {
        &self.aggregations
    }

    pub fn time_range(&self, text: &str) -> Option<String> {
        self.time_ranges.expand(text)
    }

    pub fn chart_type(&self, text: &str) -> Option<ChartType> {
        self.chart_types.find(text)
    }

    pub fn aggregation(&self, text: &str) -> Option<Aggregation> {
        self.aggregations.find(text)
    }

    pub fn is_stacked(&self, text: &str) -> bool {
        self.stacked.is_match(text)
    }

    pub fn is_comparison(&self, text: &str) -> bool {
        self.comparison.is_match(text)
    }

    /// Split on comparison separators ("vs", "versus", ...)
    pub fn split_comparison<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.comparison.split(text).collect()
    }

    /// Split on the conjunction "and"
    pub fn split_conjunction<'t>(&self, text: &'t str) -> Vec<&'t str> {
        self.conjunction.split(text).collect()
    }

    /// Remove time, chart, aggregation and modifier phrases and filler words,
    /// leaving only the words that may name an entity.
    pub fn strip(&self, phrase: &str) -> String {
        let mut term = phrase.to_string();
        for (pattern, replacement) in &self.cleanup {
            term = pattern
                .replace_all(&term, replacement.as_str())
                .into_owned();
        }
        self.whitespace.replace_all(&term, " ").trim().to_string()
    }
}
