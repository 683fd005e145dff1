//! Similarity algorithms over normalized strings.
//!
//! Every algorithm takes a `reference` (the expected value, from the source
//! entity) and a `target` (the candidate value) and returns a score in
//! [0, 1]. Several algorithms are deliberately asymmetric: finding the
//! reference *inside* the target is worth more than the reverse, because
//! extracted candidate values tend to be longer and noisier than the values
//! being searched for.
//!
//! [`compare_strings`] is the entry point used by the comparison layer. It
//! applies the shared empty-string rules (both empty is a neutral 0.5, a
//! single empty side is 0) and clamps whatever the algorithm returns into
//! range. The individual algorithm functions are exported for callers that
//! want raw scores; note that [`containment_similarity`] keeps its own,
//! stricter rule for an empty reference (0, never neutral) when called
//! directly.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ScoreError;
use crate::normalize::NormalizePolicy;
use crate::richness::{information_richness, numeric_runs};

/// Strings shorter than this take the abbreviated `smart` path.
const SMART_SHORT_LEN: usize = 5;
/// Levenshtein inside `smart` is only consulted below this length.
const SMART_LEVENSHTEIN_MAX_LEN: usize = 30;
/// Numeric tokens must be longer than this to anchor a containment match.
const CONTAINMENT_NUMERIC_MIN_LEN: usize = 3;

/// Caller-supplied scoring function for [`SimilarityAlgorithm::Custom`].
///
/// The function is fallible so a misbehaving comparator downgrades one
/// candidate instead of poisoning the batch; return `Err` with a short
/// message to have the engine skip the candidate and record the reason.
#[derive(Clone)]
pub struct CustomScorer(Arc<dyn Fn(&str, &str) -> Result<f64, String> + Send + Sync>);

impl CustomScorer {
    pub fn new(f: impl Fn(&str, &str) -> Result<f64, String> + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    /// Run the comparator on a normalized pair.
    pub fn score(&self, reference: &str, target: &str) -> Result<f64, String> {
        (self.0)(reference, target)
    }
}

impl fmt::Debug for CustomScorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomScorer")
    }
}

/// Closed set of similarity algorithms.
///
/// Serde-tagged like the rest of the configuration surface, so unknown
/// algorithm names are rejected when a rule set is deserialized. `Custom`
/// carries its comparator and therefore cannot come from serialized
/// configuration; it must be constructed in code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SimilarityAlgorithm {
    /// Strict equality.
    Exact,
    /// Substring match in either direction, favoring target ⊇ reference.
    Contains,
    /// Normalized character edit distance.
    Levenshtein,
    /// Word-set overlap.
    Jaccard,
    /// Staged "reference found inside target" heuristic.
    Containment,
    /// Composite of containment, jaccard, and levenshtein with a richness
    /// bonus. The default and the most forgiving.
    #[default]
    Smart,
    /// Caller-supplied comparator.
    #[serde(skip)]
    Custom(CustomScorer),
}

impl SimilarityAlgorithm {
    /// Normalization applied to both sides before this algorithm scores
    /// them. `Smart` and `Containment` expect markup-stripped text; the
    /// rest get the case-insensitive, whitespace-collapsed baseline.
    pub fn default_profile(&self) -> NormalizePolicy {
        match self {
            SimilarityAlgorithm::Smart | SimilarityAlgorithm::Containment => {
                NormalizePolicy::markup_aware()
            }
            _ => NormalizePolicy::default(),
        }
    }
}

impl PartialEq for SimilarityAlgorithm {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Custom(a), Self::Custom(b)) => Arc::ptr_eq(&a.0, &b.0),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

/// Score a normalized pair under `algorithm`.
///
/// Shared edge rules applied before any algorithm runs: both sides empty is
/// a neutral 0.5 (nothing to compare, nothing to contradict), exactly one
/// empty side is 0. The result is clamped to [0, 1]; a comparator that
/// produces NaN or an infinite value is a [`ScoreError`].
pub fn compare_strings(
    reference: &str,
    target: &str,
    algorithm: &SimilarityAlgorithm,
) -> Result<f64, ScoreError> {
    if reference.is_empty() && target.is_empty() {
        return Ok(0.5);
    }
    if reference.is_empty() || target.is_empty() {
        return Ok(0.0);
    }

    let raw = match algorithm {
        SimilarityAlgorithm::Exact => exact_similarity(reference, target),
        SimilarityAlgorithm::Contains => contains_similarity(reference, target),
        SimilarityAlgorithm::Levenshtein => levenshtein_similarity(reference, target),
        SimilarityAlgorithm::Jaccard => jaccard_similarity(reference, target),
        SimilarityAlgorithm::Containment => containment_similarity(reference, target),
        SimilarityAlgorithm::Smart => smart_similarity(reference, target),
        SimilarityAlgorithm::Custom(scorer) => scorer
            .score(reference, target)
            .map_err(ScoreError::Custom)?,
    };

    if !raw.is_finite() {
        return Err(ScoreError::NonFinite);
    }
    Ok(raw.clamp(0.0, 1.0))
}

/// 1 when the strings are identical, 0 otherwise.
pub fn exact_similarity(reference: &str, target: &str) -> f64 {
    if reference == target { 1.0 } else { 0.0 }
}

/// Asymmetric substring check: 0.9 when the target contains the reference,
/// 0.7 when the reference contains the target, else 0.
pub fn contains_similarity(reference: &str, target: &str) -> f64 {
    if target.contains(reference) {
        0.9
    } else if reference.contains(target) {
        0.7
    } else {
        0.0
    }
}

/// Normalized edit distance: `1 − distance / max(len)`, over characters.
/// Two empty strings are identical (1).
pub fn levenshtein_similarity(reference: &str, target: &str) -> f64 {
    let max_len = reference.chars().count().max(target.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(reference, target);
    1.0 - distance as f64 / max_len as f64
}

/// Word-set Jaccard index: |intersection| / |union| over whitespace-split,
/// de-duplicated words. Two empty sets are identical (1); exactly one empty
/// set never overlaps (0).
pub fn jaccard_similarity(reference: &str, target: &str) -> f64 {
    use std::collections::HashSet;

    let a: HashSet<&str> = reference.split_whitespace().collect();
    let b: HashSet<&str> = target.split_whitespace().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(&b).count();
    let union = a.union(&b).count();
    intersection as f64 / union as f64
}

/// Staged containment heuristic: how convincingly is the reference found
/// inside the target?
///
/// Evaluated in priority order:
/// 1. verbatim substring → 0.95
/// 2. any 2- or 3-word consecutive segment of the reference (words longer
///    than one character) found verbatim → 0.90
/// 3. more than half of the reference's long numeric tokens (> 3 digits)
///    found verbatim → 0.85
/// 4. word-level match ratio with ordering and strength bonuses, capped at
///    0.85
///
/// An empty reference never matches (0), even against an empty target.
pub fn containment_similarity(reference: &str, target: &str) -> f64 {
    if reference.is_empty() {
        return 0.0;
    }
    if target.contains(reference) {
        return 0.95;
    }

    let reference_words: Vec<&str> = reference.split_whitespace().collect();

    for size in [2usize, 3] {
        if reference_words.len() < size {
            break;
        }
        for segment in reference_words.windows(size) {
            if segment.iter().all(|word| word.chars().count() > 1)
                && target.contains(&segment.join(" "))
            {
                return 0.90;
            }
        }
    }

    let long_numbers: Vec<&str> = numeric_runs(reference)
        .filter(|run| run.len() > CONTAINMENT_NUMERIC_MIN_LEN)
        .collect();
    if !long_numbers.is_empty() {
        let found = long_numbers
            .iter()
            .filter(|number| target.contains(**number))
            .count();
        if found * 2 > long_numbers.len() {
            return 0.85;
        }
    }

    word_match_ratio(&reference_words, target)
}

/// Stage 4 of containment: the fraction of significant reference words found
/// in the target, with a +0.1 bonus when the matches appear in order and a
/// further +0.1 once the ratio clears 0.7. Capped at 0.85 so a word-level
/// match never outranks a verbatim one.
fn word_match_ratio(reference_words: &[&str], target: &str) -> f64 {
    let target_words: Vec<&str> = target.split_whitespace().collect();

    // Short words are noise unless they are numbers ("42 main st").
    let significant: Vec<&str> = reference_words
        .iter()
        .filter(|word| word.chars().count() >= 3 || word.chars().all(|ch| ch.is_ascii_digit()))
        .copied()
        .collect();
    if significant.is_empty() {
        return 0.0;
    }

    let mut positions: Vec<usize> = Vec::new();
    for word in &significant {
        let hit = target_words
            .iter()
            .position(|candidate| candidate == word || candidate.contains(word) || word.contains(candidate));
        if let Some(index) = hit {
            positions.push(index);
        }
    }
    if positions.is_empty() {
        return 0.0;
    }

    let ratio = positions.len() as f64 / significant.len() as f64;
    let mut score = ratio;
    if positions.len() >= 2 && positions.windows(2).all(|pair| pair[0] < pair[1]) {
        score += 0.1;
    }
    if ratio > 0.7 {
        score += 0.1;
    }
    score.min(0.85)
}

/// Composite scorer and the default algorithm.
///
/// Short strings carry too little signal for the staged heuristics, so below
/// five characters the score collapses to
/// exact / contains-either-way / neutral. Longer strings blend containment,
/// jaccard, and (for short enough inputs) levenshtein, then earn a small
/// bonus for an information-rich target so that between two otherwise equal
/// candidates the more detailed one wins.
pub fn smart_similarity(reference: &str, target: &str) -> f64 {
    let reference_len = reference.chars().count();
    let target_len = target.chars().count();

    if reference_len < SMART_SHORT_LEN || target_len < SMART_SHORT_LEN {
        return if reference == target {
            1.0
        } else if !reference.is_empty() && target.contains(reference) {
            0.95
        } else if !target.is_empty() && reference.contains(target) {
            0.9
        } else {
            0.5
        };
    }

    if target.contains(reference) {
        return (0.95 + information_richness(target) * 0.05).min(1.0);
    }

    let containment = containment_similarity(reference, target);
    let jaccard = jaccard_similarity(reference, target);

    let base = if containment > 0.7 {
        containment
    } else if jaccard > 0.6 {
        (containment * 0.7 + jaccard * 0.3).max(0.6)
    } else {
        let levenshtein =
            if reference_len < SMART_LEVENSHTEIN_MAX_LEN && target_len < SMART_LEVENSHTEIN_MAX_LEN {
                levenshtein_similarity(reference, target)
            } else {
                0.0
            };
        containment * 0.7 + jaccard * 0.2 + levenshtein * 0.1
    };

    (base + information_richness(target) * 0.05).min(1.0)
}
