//! Approximate substring scoring
//!
//! Bitap (shift-or) search with an error budget and a proximity penalty.
//! Scores are distances: 0.0 is an exact match, 1.0 means no match.

use ahash::AHashMap;

/// Patterns longer than this are scored in chunks and averaged
pub const MAX_PATTERN_BITS: usize = 32;

/// Tuning for a single Bitap search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitapOptions {
    /// Where in the text a match is expected to start
    pub location: usize,
    /// How far from `location` a match may drift before it costs a full error
    pub distance: usize,
    /// Scores above this are not reported as matches
    pub threshold: f64,
}

impl Default for BitapOptions {
    fn default() -> Self {
        Self {
            location: 0,
            distance: 100,
            threshold: 0.6,
        }
    }
}

/// Outcome of scoring one pattern against one field
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMatch {
    pub is_match: bool,
    pub score: f64,
}

impl FieldMatch {
    const NONE: FieldMatch = FieldMatch {
        is_match: false,
        score: 1.0,
    };
}

#[derive(Debug, Clone)]
struct PatternChunk {
    chars: Vec<char>,
    alphabet: AHashMap<char, u64>,
    start_index: usize,
}

impl PatternChunk {
    fn new(chars: &[char], start_index: usize) -> Self {
        let len = chars.len();
        let mut alphabet: AHashMap<char, u64> = AHashMap::with_capacity(len);
        for (i, c) in chars.iter().enumerate() {
            *alphabet.entry(*c).or_insert(0) |= 1 << (len - i - 1);
        }

        Self {
            chars: chars.to_vec(),
            alphabet,
            start_index,
        }
    }
}

/// A lowercased search pattern prepared for repeated Bitap scoring
#[derive(Debug, Clone)]
pub struct BitapPattern {
    pattern: String,
    chunks: Vec<PatternChunk>,
}

impl BitapPattern {
    pub fn new(pattern: &str) -> Self {
        let pattern = pattern.to_lowercase();
        let chars: Vec<char> = pattern.chars().collect();
        let len = chars.len();

        let mut chunks = Vec::new();
        if len > MAX_PATTERN_BITS {
            let remainder = len % MAX_PATTERN_BITS;
            let end = len - remainder;
            let mut i = 0;
            while i < end {
                chunks.push(PatternChunk::new(&chars[i..i + MAX_PATTERN_BITS], i));
                i += MAX_PATTERN_BITS;
            }
            if remainder > 0 {
                let start_index = len - MAX_PATTERN_BITS;
                chunks.push(PatternChunk::new(&chars[start_index..], start_index));
            }
        } else if len > 0 {
            chunks.push(PatternChunk::new(&chars, 0));
        }

        Self { pattern, chunks }
    }

    pub fn as_str(&self) -> &str {
        &self.pattern
    }

    /// Score this pattern against `text`, case-insensitively
    pub fn search_in(&self, text: &str, options: &BitapOptions) -> FieldMatch {
        if self.chunks.is_empty() {
            return FieldMatch::NONE;
        }

        let text = text.to_lowercase();
        if text == self.pattern {
            return FieldMatch {
                is_match: true,
                score: 0.0,
            };
        }

        let text: Vec<char> = text.chars().collect();
        let mut total = 0.0;
        let mut matched = false;
        for chunk in &self.chunks {
            let result = search_chunk(&text, chunk, options);
            matched |= result.is_match;
            total += result.score;
        }

        if matched {
            FieldMatch {
                is_match: true,
                score: total / self.chunks.len() as f64,
            }
        } else {
            FieldMatch::NONE
        }
    }
}

fn compute_score(
    pattern_len: usize,
    errors: usize,
    current: usize,
    expected: usize,
    distance: usize,
) -> f64 {
    let accuracy = errors as f64 / pattern_len as f64;
    let proximity = current.abs_diff(expected);
    if distance == 0 {
        return if proximity > 0 { 1.0 } else { accuracy };
    }
    accuracy + proximity as f64 / distance as f64
}

fn find_from(text: &[char], pattern: &[char], from: usize) -> Option<usize> {
    if from > text.len() || pattern.len() > text.len() - from {
        return None;
    }
    text[from..]
        .windows(pattern.len())
        .position(|window| window == pattern)
        .map(|offset| from + offset)
}

fn search_chunk(text: &[char], chunk: &PatternChunk, options: &BitapOptions) -> FieldMatch {
    let pattern = &chunk.chars;
    let pattern_len = pattern.len();
    let text_len = text.len();
    let expected = (options.location + chunk.start_index).min(text_len);
    let score = |errors: usize, current: usize| {
        compute_score(pattern_len, errors, current, expected, options.distance)
    };

    // Exact occurrences tighten the threshold before the fuzzy passes.
    let mut threshold = options.threshold;
    let mut cursor = expected;
    while let Some(index) = find_from(text, pattern, cursor) {
        threshold = threshold.min(score(0, index));
        cursor = index + pattern_len;
    }

    let mut best_location: Option<usize> = None;
    let mut final_score = 1.0;
    let mut last_bits: Vec<u64> = Vec::new();
    let mut bin_max = pattern_len + text_len;
    let mask: u64 = 1 << (pattern_len - 1);

    for errors in 0..pattern_len {
        // Widest drift from `expected` still affordable at this error level.
        let mut bin_min = 0;
        let mut bin_mid = bin_max;
        while bin_min < bin_mid {
            if score(errors, expected + bin_mid) <= threshold {
                bin_min = bin_mid;
            } else {
                bin_max = bin_mid;
            }
            bin_mid = (bin_max - bin_min) / 2 + bin_min;
        }
        bin_max = bin_mid;

        let mut start = (expected + 1).saturating_sub(bin_mid).max(1);
        let finish = (expected + bin_mid).min(text_len) + pattern_len;

        let mut bits = vec![0u64; finish + 2];
        bits[finish + 1] = (1 << errors) - 1;
        let last = |k: usize| last_bits.get(k).copied().unwrap_or(0);

        let mut j = finish;
        while j >= start {
            let current = j - 1;
            let char_match = text
                .get(current)
                .and_then(|c| chunk.alphabet.get(c))
                .copied()
                .unwrap_or(0);

            bits[j] = ((bits[j + 1] << 1) | 1) & char_match;
            if errors > 0 {
                bits[j] |= ((last(j + 1) | last(j)) << 1) | 1 | last(j + 1);
            }

            if bits[j] & mask != 0 {
                final_score = score(errors, current);
                if final_score <= threshold {
                    threshold = final_score;
                    best_location = Some(current);
                    if current <= expected {
                        break;
                    }
                    start = (2 * expected).saturating_sub(current).max(1);
                }
            }
            j -= 1;
        }

        if score(errors + 1, expected) > threshold {
            break;
        }
        last_bits = bits;
    }

    FieldMatch {
        is_match: best_location.is_some(),
        score: f64::max(0.001, final_score),
    }
}
