//! Field-level and entity-level comparison.
//!
//! [`compare_entities`] scores one candidate against the source: each
//! configured field is normalized under its algorithm's default profile,
//! scored, and folded into a weighted average. Required (`must_match`)
//! fields gate the whole candidate independently of the aggregate.
//!
//! Two special paths are worth knowing about:
//!
//! - An empty rule list auto-generates one `smart` rule per source field.
//! - A rule list with exactly one `smart` rule compares *whole records*:
//!   every available source value and every candidate value are
//!   concatenated and scored holistically instead of column against
//!   column. Single-field smart setups are how callers ask for "match
//!   this record", and one column rarely carries the whole identity.

use std::collections::BTreeMap;

use crate::config::FieldRule;
use crate::error::CandidateError;
use crate::normalize::normalize_text;
use crate::similarity::{SimilarityAlgorithm, compare_strings};
use crate::types::{CandidateItem, ComparisonResult, SourceEntity};

/// Compare one candidate against the source under `rules`.
///
/// `global_threshold` is used both for the `meets_threshold` flag and as
/// the fallback threshold for `must_match` fields without their own.
///
/// Errors are per-candidate scoring failures (a custom comparator erred or
/// produced a non-finite value); the caller is expected to skip the
/// candidate and continue the batch.
pub fn compare_entities(
    source: &SourceEntity,
    candidate: &CandidateItem,
    rules: &[FieldRule],
    global_threshold: f64,
) -> Result<ComparisonResult, CandidateError> {
    // A source with no usable values cannot match anything.
    if source.is_blank() {
        return Ok(ComparisonResult {
            field_scores: BTreeMap::new(),
            overall: 0.0,
            meets_threshold: false,
            required_fields_met: false,
        });
    }

    let generated;
    let rules = if rules.is_empty() {
        generated = FieldRule::auto_for(source);
        &generated[..]
    } else {
        rules
    };

    if let [rule] = rules {
        if matches!(rule.algorithm, SimilarityAlgorithm::Smart) {
            return compare_whole_record(source, candidate, rule, global_threshold);
        }
    }

    let mut field_scores = BTreeMap::new();
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;
    let mut required_met = true;

    for rule in rules {
        let Some(source_value) = source.value(&rule.field) else {
            // A blank source value contributes nothing; if the field is
            // required, the candidate is disqualified outright.
            if rule.must_match {
                required_met = false;
            }
            continue;
        };

        let score = score_field(rule, source_value, candidate.value(&rule.field))?;
        field_scores.insert(rule.field.clone(), score);
        weighted_sum += score * rule.weight;
        total_weight += rule.weight;

        if rule.must_match && score < rule.threshold.unwrap_or(global_threshold) {
            required_met = false;
        }
    }

    let overall = if total_weight > 0.0 {
        weighted_sum / total_weight
    } else {
        0.0
    };

    Ok(ComparisonResult {
        field_scores,
        overall,
        meets_threshold: overall >= global_threshold,
        required_fields_met: required_met,
    })
}

/// Whole-record comparison: concatenate every available value on both sides
/// and score the two blobs under the single configured rule.
fn compare_whole_record(
    source: &SourceEntity,
    candidate: &CandidateItem,
    rule: &FieldRule,
    global_threshold: f64,
) -> Result<ComparisonResult, CandidateError> {
    let score = score_field(rule, &source.concatenated(), &candidate.concatenated())?;

    let mut field_scores = BTreeMap::new();
    field_scores.insert(rule.field.clone(), score);

    let required_met = !rule.must_match || score >= rule.threshold.unwrap_or(global_threshold);

    Ok(ComparisonResult {
        field_scores,
        overall: score,
        meets_threshold: score >= global_threshold,
        required_fields_met: required_met,
    })
}

/// Normalize both sides under the rule's algorithm profile and score them.
fn score_field(
    rule: &FieldRule,
    source_value: &str,
    candidate_value: &str,
) -> Result<f64, CandidateError> {
    let profile = rule.algorithm.default_profile();
    let reference = normalize_text(source_value, &profile);
    let target = normalize_text(candidate_value, &profile);

    compare_strings(&reference, &target, &rule.algorithm).map_err(|source| CandidateError {
        field: rule.field.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScoreError;
    use crate::similarity::CustomScorer;

    fn acme_source() -> SourceEntity {
        SourceEntity::new()
            .with_field("name", "Acme Corp")
            .with_field("phone", "5551234")
    }

    #[test]
    fn weighted_two_field_comparison() {
        let rules = vec![
            FieldRule::new("name")
                .with_weight(2.0)
                .with_threshold(0.8)
                .required(),
            FieldRule::new("phone")
                .with_algorithm(SimilarityAlgorithm::Exact),
        ];
        let candidate = CandidateItem::new(0)
            .with_field("name", "ACME CORP INC")
            .with_field("phone", "5551234");

        let result = compare_entities(&acme_source(), &candidate, &rules, 0.7).expect("comparison");

        let name_score = result.field_scores["name"];
        let phone_score = result.field_scores["phone"];
        assert!(name_score >= 0.95, "smart containment, got {name_score}");
        assert_eq!(phone_score, 1.0);

        let expected = (name_score * 2.0 + phone_score) / 3.0;
        assert!((result.overall - expected).abs() < 1e-12);
        assert!(result.overall > 0.95);
        assert!(result.required_fields_met, "0.95+ clears the 0.8 bar");
        assert!(result.meets_threshold);
    }

    #[test]
    fn case_and_whitespace_are_normalized_away() {
        let rules = vec![FieldRule::new("phone").with_algorithm(SimilarityAlgorithm::Exact)];
        let candidate = CandidateItem::new(0).with_field("phone", "  555  1234 ");
        let source = SourceEntity::new().with_field("phone", "555 1234");

        let result = compare_entities(&source, &candidate, &rules, 0.7).expect("comparison");
        assert_eq!(result.field_scores["phone"], 1.0);
    }

    #[test]
    fn blank_source_field_contributes_nothing() {
        let source = SourceEntity::new()
            .with_field("name", "Acme Corp")
            .with_missing_field("phone");
        let rules = vec![
            FieldRule::new("name").with_algorithm(SimilarityAlgorithm::Exact),
            FieldRule::new("phone")
                .with_weight(10.0)
                .with_algorithm(SimilarityAlgorithm::Exact),
        ];
        let candidate = CandidateItem::new(0)
            .with_field("name", "acme corp")
            .with_field("phone", "5551234");

        let result = compare_entities(&source, &candidate, &rules, 0.7).expect("comparison");
        // Phone is absent from the scores and its weight is not counted.
        assert!(!result.field_scores.contains_key("phone"));
        assert_eq!(result.overall, 1.0);
        assert!(result.required_fields_met);
    }

    #[test]
    fn blank_required_source_field_disqualifies() {
        let source = SourceEntity::new()
            .with_field("name", "Acme Corp")
            .with_missing_field("phone");
        let rules = vec![
            FieldRule::new("name").with_algorithm(SimilarityAlgorithm::Exact),
            FieldRule::new("phone")
                .with_algorithm(SimilarityAlgorithm::Exact)
                .required(),
        ];
        let candidate = CandidateItem::new(0)
            .with_field("name", "acme corp")
            .with_field("phone", "5551234");

        let result = compare_entities(&source, &candidate, &rules, 0.7).expect("comparison");
        assert!(!result.required_fields_met);
        // The aggregate is unaffected by the blank field.
        assert_eq!(result.overall, 1.0);
    }

    #[test]
    fn all_blank_source_is_unmatchable() {
        let source = SourceEntity::new()
            .with_missing_field("name")
            .with_field("phone", "  ");
        let candidate = CandidateItem::new(0)
            .with_field("name", "anything")
            .with_field("phone", "5551234");

        let result = compare_entities(&source, &candidate, &[], 0.7).expect("comparison");
        assert_eq!(result.overall, 0.0);
        assert!(result.field_scores.is_empty());
        assert!(!result.meets_threshold);
        assert!(!result.required_fields_met);
    }

    #[test]
    fn required_field_below_its_threshold_disqualifies() {
        let rules = vec![
            FieldRule::new("name")
                .with_algorithm(SimilarityAlgorithm::Exact)
                .with_threshold(0.9)
                .required(),
            FieldRule::new("phone").with_algorithm(SimilarityAlgorithm::Exact),
        ];
        let candidate = CandidateItem::new(0)
            .with_field("name", "Completely Different")
            .with_field("phone", "5551234");

        let result = compare_entities(&acme_source(), &candidate, &rules, 0.1).expect("comparison");
        assert!(!result.required_fields_met);
        // The global threshold check is independent of the required gate.
        assert!(result.meets_threshold, "phone still carries the average");
    }

    #[test]
    fn required_field_falls_back_to_global_threshold() {
        let rules = vec![FieldRule::new("name")
            .with_algorithm(SimilarityAlgorithm::Exact)
            .required()];
        let candidate = CandidateItem::new(0).with_field("name", "other name");

        // Exact mismatch scores 0; with a global threshold of 0.5 the
        // required gate fails.
        let result = compare_entities(&acme_source(), &candidate, &rules, 0.5).expect("comparison");
        assert!(!result.required_fields_met);
    }

    #[test]
    fn empty_rules_auto_generate_per_field() {
        let candidate = CandidateItem::new(0)
            .with_field("name", "Acme Corp Inc")
            .with_field("phone", "5551234");

        let result = compare_entities(&acme_source(), &candidate, &[], 0.7).expect("comparison");
        // Two auto rules means the whole-record path does not apply; both
        // fields are scored individually.
        assert_eq!(result.field_scores.len(), 2);
        assert!(result.field_scores["name"] >= 0.95);
        assert!(result.field_scores["phone"] >= 0.95);
    }

    #[test]
    fn single_smart_rule_compares_whole_records() {
        let source = SourceEntity::new()
            .with_field("name", "Acme Corp")
            .with_field("city", "Portland");
        let rules = vec![FieldRule::new("name")];

        // The candidate's name column alone would not contain the source
        // name, but the concatenated record does.
        let candidate = CandidateItem::new(0)
            .with_field("city", "Portland Acme")
            .with_field("name", "Corp");

        let result = compare_entities(&source, &candidate, &rules, 0.7).expect("comparison");
        assert_eq!(result.field_scores.len(), 1);
        let score = result.field_scores["name"];
        assert!(
            score >= 0.85,
            "whole-record comparison should see the overlap, got {score}"
        );
    }

    #[test]
    fn single_non_smart_rule_stays_field_scoped() {
        let rules = vec![FieldRule::new("name").with_algorithm(SimilarityAlgorithm::Exact)];
        let source = SourceEntity::new()
            .with_field("name", "Acme")
            .with_field("city", "Portland");
        let candidate = CandidateItem::new(0)
            .with_field("name", "acme")
            .with_field("city", "elsewhere");

        let result = compare_entities(&source, &candidate, &rules, 0.7).expect("comparison");
        assert_eq!(result.field_scores["name"], 1.0);
        assert_eq!(result.overall, 1.0);
    }

    #[test]
    fn zero_total_weight_yields_zero_overall() {
        let rules = vec![
            FieldRule::new("name")
                .with_weight(0.0)
                .with_algorithm(SimilarityAlgorithm::Exact),
            FieldRule::new("phone")
                .with_weight(0.0)
                .with_algorithm(SimilarityAlgorithm::Exact),
        ];
        let candidate = CandidateItem::new(0)
            .with_field("name", "acme corp")
            .with_field("phone", "5551234");

        let result = compare_entities(&acme_source(), &candidate, &rules, 0.7).expect("comparison");
        assert_eq!(result.overall, 0.0);
        assert!(!result.meets_threshold);
    }

    #[test]
    fn markup_is_stripped_for_smart_fields() {
        let rules = vec![FieldRule::new("name"), FieldRule::new("phone")];
        let candidate = CandidateItem::new(0)
            .with_field("name", "<b>ACME</b> <i>CORP</i> <script>x()</script>Inc")
            .with_field("phone", "5551234");

        let result = compare_entities(&acme_source(), &candidate, &rules, 0.7).expect("comparison");
        assert!(result.field_scores["name"] >= 0.9);
    }

    #[test]
    fn custom_scorer_failure_names_the_field() {
        let rules = vec![
            FieldRule::new("name").with_algorithm(SimilarityAlgorithm::Custom(CustomScorer::new(
                |_, _| Err("boom".into()),
            ))),
        ];
        let candidate = CandidateItem::new(0).with_field("name", "whatever");

        let err = compare_entities(&acme_source(), &candidate, &rules, 0.7)
            .expect_err("custom failure should surface");
        assert_eq!(err.field, "name");
        assert_eq!(err.source, ScoreError::Custom("boom".into()));
    }

    #[test]
    fn missing_candidate_field_scores_zero() {
        let rules = vec![FieldRule::new("phone").with_algorithm(SimilarityAlgorithm::Exact)];
        let candidate = CandidateItem::new(0).with_field("name", "Acme Corp");

        let result = compare_entities(&acme_source(), &candidate, &rules, 0.7).expect("comparison");
        assert_eq!(result.field_scores["phone"], 0.0);
    }
}
