//! Configuration for a match run.
//!
//! [`MatchConfig`] carries the run-wide knobs (threshold, result cap,
//! selection mode); [`FieldRule`] configures one field comparison. Both are
//! cheap to clone and serde-friendly so callers can load rule sets from
//! JSON or embed them in higher-level configs. Validation happens before
//! any candidate is scored: a bad configuration fails the whole run up
//! front rather than producing partial results.

use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::similarity::SimilarityAlgorithm;
use crate::types::SourceEntity;

/// Selection policy applied to candidates at or above the threshold.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Select only the highest-ranked candidate above the threshold.
    #[default]
    Best,
    /// Select every candidate above the threshold.
    All,
    /// Select the first above-threshold candidate in ranked order.
    ///
    /// Ranking precedes selection, so this behaves exactly like [`Best`];
    /// the variant exists for callers that configure it explicitly.
    ///
    /// [`Best`]: MatchMode::Best
    FirstAboveThreshold,
}

/// Run-wide matching configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchConfig {
    /// Global similarity threshold in [0, 1]. Per-field thresholds fall
    /// back to this value.
    #[serde(default = "MatchConfig::default_threshold")]
    pub threshold: f64,
    /// Maximum number of ranked results to keep; 0 keeps all.
    #[serde(default)]
    pub limit_results: usize,
    /// Selection policy for above-threshold candidates.
    #[serde(default)]
    pub mode: MatchMode,
}

impl MatchConfig {
    pub(crate) fn default_threshold() -> f64 {
        0.7
    }

    /// Validate the run-wide configuration.
    pub fn validate(&self) -> Result<(), MatchError> {
        if !self.threshold.is_finite() || !(0.0..=1.0).contains(&self.threshold) {
            return Err(MatchError::InvalidConfig(format!(
                "threshold must be within [0.0, 1.0], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            threshold: Self::default_threshold(),
            limit_results: 0,
            mode: MatchMode::default(),
        }
    }
}

/// Configuration for one field comparison.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldRule {
    /// Field name, shared between source and candidate records.
    pub field: String,
    /// Non-negative weight of this field in the overall similarity.
    #[serde(default = "FieldRule::default_weight")]
    pub weight: f64,
    /// Similarity algorithm for this field.
    #[serde(default)]
    pub algorithm: SimilarityAlgorithm,
    /// Per-field similarity threshold; `None` falls back to the global one.
    #[serde(default)]
    pub threshold: Option<f64>,
    /// When set, the candidate is disqualified unless this field clears its
    /// threshold, regardless of the aggregate score.
    #[serde(default)]
    pub must_match: bool,
    /// Extraction-stage narrowing hint. Carried through unexamined; the
    /// engine never interprets it.
    #[serde(default)]
    pub target_hint: Option<String>,
}

impl FieldRule {
    /// A weight-1 `smart` rule for `field`.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            weight: Self::default_weight(),
            algorithm: SimilarityAlgorithm::default(),
            threshold: None,
            must_match: false,
            target_hint: None,
        }
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    pub fn with_algorithm(mut self, algorithm: SimilarityAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = Some(threshold);
        self
    }

    /// Mark this field as required.
    pub fn required(mut self) -> Self {
        self.must_match = true;
        self
    }

    pub fn with_target_hint(mut self, hint: impl Into<String>) -> Self {
        self.target_hint = Some(hint.into());
        self
    }

    pub(crate) fn default_weight() -> f64 {
        1.0
    }

    /// Validate this rule.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.field.trim().is_empty() {
            return Err(MatchError::InvalidConfig(
                "field rule requires a non-empty field name".into(),
            ));
        }
        if !self.weight.is_finite() || self.weight < 0.0 {
            return Err(MatchError::InvalidConfig(format!(
                "field `{}`: weight must be non-negative, got {}",
                self.field, self.weight
            )));
        }
        if let Some(threshold) = self.threshold {
            if !threshold.is_finite() || !(0.0..=1.0).contains(&threshold) {
                return Err(MatchError::InvalidConfig(format!(
                    "field `{}`: threshold must be within [0.0, 1.0], got {threshold}",
                    self.field
                )));
            }
        }
        Ok(())
    }

    /// One default rule per source field, used when the caller supplies no
    /// rules at all.
    pub fn auto_for(source: &SourceEntity) -> Vec<FieldRule> {
        source.fields.keys().map(FieldRule::new).collect()
    }
}
