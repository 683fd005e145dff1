//! Data model for a match run.
//!
//! A run compares one [`SourceEntity`] against a batch of [`CandidateItem`]s
//! and produces a [`MatchReport`]. Everything here is an immutable value
//! object: the engine holds no state between runs, and all types are
//! serde-friendly so results can cross process boundaries.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The reference record a match run searches for.
///
/// Field values are optional; a missing value and a blank value are treated
/// identically by the comparison layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SourceEntity {
    /// Field name → optional raw value.
    pub fields: BTreeMap<String, Option<String>>,
}

impl SourceEntity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insert.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), Some(value.into()));
        self
    }

    /// Record a field that exists but has no value.
    pub fn with_missing_field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), None);
        self
    }

    /// The non-blank value for `name`, if any.
    pub fn value(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .and_then(|value| value.as_deref())
            .filter(|value| !value.trim().is_empty())
    }

    /// True when every field value is blank or missing.
    pub fn is_blank(&self) -> bool {
        self.fields
            .values()
            .all(|value| value.as_deref().is_none_or(|v| v.trim().is_empty()))
    }

    /// All non-blank values joined with single spaces, in field order. Used
    /// for whole-record comparison.
    pub fn concatenated(&self) -> String {
        let mut out = String::new();
        for value in self.fields.values().flatten() {
            if value.trim().is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(value);
        }
        out
    }
}

/// One externally extracted record to score against the source.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateItem {
    /// Position in the originally extracted batch. Stable across the run so
    /// callers can correlate results with their own records.
    pub index: usize,
    /// Field name → extracted value.
    pub fields: BTreeMap<String, String>,
    /// Opaque back-reference for the action layer. The engine never
    /// dereferences or interprets it; `Null` is perfectly valid.
    #[serde(default)]
    pub reference: JsonValue,
}

impl CandidateItem {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            fields: BTreeMap::new(),
            reference: JsonValue::Null,
        }
    }

    /// Builder-style field insert.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Attach the action layer's back-reference.
    pub fn with_reference(mut self, reference: JsonValue) -> Self {
        self.reference = reference;
        self
    }

    /// The value for `name`, or the empty string when absent.
    pub fn value(&self, name: &str) -> &str {
        self.fields.get(name).map_or("", String::as_str)
    }

    /// All field values joined with single spaces, in field order.
    pub fn concatenated(&self) -> String {
        let mut out = String::new();
        for value in self.fields.values() {
            if value.trim().is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(value);
        }
        out
    }
}

/// Outcome of comparing one candidate against the source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ComparisonResult {
    /// Per-field similarity scores, keyed by configured field name.
    pub field_scores: BTreeMap<String, f64>,
    /// Weighted average of the field scores.
    pub overall: f64,
    /// Whether `overall` clears the global threshold.
    pub meets_threshold: bool,
    /// Whether every `must_match` field cleared its own threshold.
    pub required_fields_met: bool,
}

/// A scored candidate in ranked order, ready for the action layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchResult {
    /// Original batch position of the candidate.
    pub index: usize,
    /// The candidate's opaque back-reference, passed through untouched.
    pub reference: JsonValue,
    /// Per-field similarity scores.
    pub field_scores: BTreeMap<String, f64>,
    /// Weighted overall similarity.
    pub overall: f64,
    /// Whether `overall` clears the global threshold.
    pub meets_threshold: bool,
    /// Whether required fields were satisfied (always true for ranked
    /// results; disqualified candidates never reach the report).
    pub required_fields_met: bool,
    /// Information richness of the candidate's concatenated field values.
    pub richness: f64,
    /// Whether the configured match mode selected this candidate.
    pub selected: bool,
}

/// A candidate dropped because scoring it failed. The batch continues
/// without it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SkippedCandidate {
    /// Original batch position of the candidate.
    pub index: usize,
    /// Human-readable failure reason.
    pub reason: String,
}

/// Why a run ended the way it did. No-match conditions are outcomes, not
/// errors: a caller can always distinguish "ran and found nothing" from
/// "failed to run" (the latter is a [`MatchError`](crate::error::MatchError)
/// before any scoring happens).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchOutcome {
    /// At least one candidate was selected.
    Matched {
        /// Number of selected candidates.
        selected: usize,
    },
    /// The candidate batch was empty.
    NoCandidates,
    /// Candidates were scored but none reached the threshold.
    NoneAboveThreshold {
        /// The global threshold in effect.
        threshold: f64,
    },
}

impl MatchOutcome {
    /// True for the `Matched` outcome.
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Matched { .. })
    }
}

impl fmt::Display for MatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchOutcome::Matched { selected } => {
                write!(f, "matched {selected} candidate(s)")
            }
            MatchOutcome::NoCandidates => f.write_str("no items to compare"),
            MatchOutcome::NoneAboveThreshold { threshold } => {
                write!(f, "no matches found above threshold {threshold}")
            }
        }
    }
}

/// The full result of one match run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchReport {
    /// Every ranked candidate, best first, with `selected` flags applied.
    pub results: Vec<MatchResult>,
    /// Convenience handle on the highest-ranked selected result.
    pub best: Option<MatchResult>,
    /// Why the run ended the way it did.
    pub outcome: MatchOutcome,
    /// Candidates dropped because scoring them failed.
    pub skipped: Vec<SkippedCandidate>,
}

impl MatchReport {
    /// The selected results, in ranked order.
    pub fn selected(&self) -> impl Iterator<Item = &MatchResult> {
        self.results.iter().filter(|result| result.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn source_blankness() {
        let empty = SourceEntity::new();
        assert!(empty.is_blank());

        let blank = SourceEntity::new()
            .with_missing_field("name")
            .with_field("phone", "   ");
        assert!(blank.is_blank());
        assert_eq!(blank.value("phone"), None);

        let populated = blank.with_field("name", "Acme");
        assert!(!populated.is_blank());
        assert_eq!(populated.value("name"), Some("Acme"));
    }

    #[test]
    fn concatenation_skips_blanks_and_orders_by_field_name() {
        let source = SourceEntity::new()
            .with_field("name", "Acme")
            .with_field("city", "Portland")
            .with_missing_field("phone");
        // BTreeMap order: city before name.
        assert_eq!(source.concatenated(), "Portland Acme");

        let candidate = CandidateItem::new(0)
            .with_field("name", "Acme Corp")
            .with_field("city", "");
        assert_eq!(candidate.concatenated(), "Acme Corp");
    }

    #[test]
    fn candidate_reference_round_trips_untouched() {
        let candidate = CandidateItem::new(3)
            .with_field("name", "Acme")
            .with_reference(json!({"row": 3, "handle": "el-987"}));

        let json_text = serde_json::to_string(&candidate).expect("serialize");
        let back: CandidateItem = serde_json::from_str(&json_text).expect("deserialize");
        assert_eq!(back, candidate);
        assert_eq!(back.reference["handle"], "el-987");
    }

    #[test]
    fn candidate_reference_defaults_to_null() {
        let candidate: CandidateItem =
            serde_json::from_str(r#"{"index": 1, "fields": {"name": "x"}}"#).expect("deserialize");
        assert!(candidate.reference.is_null());
    }

    #[test]
    fn outcome_display_strings() {
        assert_eq!(MatchOutcome::NoCandidates.to_string(), "no items to compare");
        assert_eq!(
            MatchOutcome::NoneAboveThreshold { threshold: 0.7 }.to_string(),
            "no matches found above threshold 0.7"
        );
        assert_eq!(
            MatchOutcome::Matched { selected: 2 }.to_string(),
            "matched 2 candidate(s)"
        );
        assert!(MatchOutcome::Matched { selected: 1 }.is_match());
        assert!(!MatchOutcome::NoCandidates.is_match());
    }
}
