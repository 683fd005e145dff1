//! Information richness scoring.
//!
//! Estimates how much distinguishing information a string carries. The score
//! is used only to order candidates whose overall similarity is a near-tie;
//! it never pushes a candidate across the match threshold on its own.
//!
//! Five sub-metrics, each normalized to [0, 1] and combined with fixed
//! weights: raw length, density of numeric runs, labeled-field patterns
//! ("id:", "phone:", "date:"), identifier-like tokens, and unique-word
//! ratio.

/// Character length at which the length sub-metric saturates.
const LENGTH_CAP: usize = 500;
/// Numeric-run count at which the digit sub-metric saturates.
const NUMERIC_RUN_CAP: usize = 10;
/// Labeled-field match count at which the label sub-metric saturates.
const LABEL_CAP: usize = 5;
/// Identifier token count at which the identifier sub-metric saturates.
const IDENTIFIER_CAP: usize = 3;
/// Minimum length for a token to count as identifier-like.
const IDENTIFIER_MIN_LEN: usize = 6;

const LENGTH_WEIGHT: f64 = 0.20;
const NUMERIC_WEIGHT: f64 = 0.25;
const LABEL_WEIGHT: f64 = 0.25;
const IDENTIFIER_WEIGHT: f64 = 0.15;
const UNIQUE_WORD_WEIGHT: f64 = 0.15;

/// Score how much information `text` carries, in [0, 1].
pub fn information_richness(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }

    let length_score = cap_ratio(text.chars().count(), LENGTH_CAP);
    let numeric_score = cap_ratio(numeric_runs(text).count(), NUMERIC_RUN_CAP);
    let label_score = cap_ratio(labeled_field_count(text), LABEL_CAP);
    let identifier_score = cap_ratio(identifier_token_count(text), IDENTIFIER_CAP);
    let unique_score = unique_word_ratio(text);

    let combined = length_score * LENGTH_WEIGHT
        + numeric_score * NUMERIC_WEIGHT
        + label_score * LABEL_WEIGHT
        + identifier_score * IDENTIFIER_WEIGHT
        + unique_score * UNIQUE_WORD_WEIGHT;
    combined.min(1.0)
}

fn cap_ratio(count: usize, cap: usize) -> f64 {
    (count as f64 / cap as f64).min(1.0)
}

/// Maximal runs of ASCII digits, in order of appearance.
pub(crate) fn numeric_runs(text: &str) -> impl Iterator<Item = &str> {
    text.split(|ch: char| !ch.is_ascii_digit())
        .filter(|run| !run.is_empty())
}

/// Occurrences of a label shape: an alphanumeric character immediately
/// followed by ':', as in "id:", "phone:", "date:".
fn labeled_field_count(text: &str) -> usize {
    let mut count = 0;
    let mut prev_alnum = false;
    for ch in text.chars() {
        if ch == ':' && prev_alnum {
            count += 1;
        }
        prev_alnum = ch.is_alphanumeric();
    }
    count
}

/// Tokens that look like opaque identifiers: at least six characters, fully
/// alphanumeric, mixing letters and digits ("INV2024X", "a1b2c3d4").
fn identifier_token_count(text: &str) -> usize {
    text.split_whitespace()
        .filter(|token| {
            token.chars().count() >= IDENTIFIER_MIN_LEN
                && token.chars().all(char::is_alphanumeric)
                && token.chars().any(|ch| ch.is_ascii_digit())
                && token.chars().any(char::is_alphabetic)
        })
        .count()
}

/// Distinct words over total words; 0 for wordless input.
fn unique_word_ratio(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let unique: std::collections::HashSet<&str> = words.iter().copied().collect();
    unique.len() as f64 / words.len() as f64
}
