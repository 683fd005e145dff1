//! Match selection over a candidate batch.
//!
//! [`MatchEngine`] is the crate's top-level entry point: it scores every
//! candidate against the source (in parallel for large batches), drops the
//! disqualified ones, ranks the survivors by overall similarity with an
//! information-richness tie-break, and applies the configured selection
//! mode. The engine is stateless between runs; construction validates all
//! configuration so a run itself can only fail per candidate, never as a
//! whole.

use std::cmp::Ordering;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{Level, debug, info, warn};

use crate::compare::compare_entities;
use crate::config::{FieldRule, MatchConfig, MatchMode};
use crate::error::{CandidateError, MatchError};
use crate::metrics::metrics_recorder;
use crate::richness::information_richness;
use crate::types::{
    CandidateItem, ComparisonResult, MatchOutcome, MatchReport, MatchResult, SkippedCandidate,
    SourceEntity,
};

/// Batches at least this large are scored on the rayon pool; smaller ones
/// sequentially, where thread coordination would cost more than it saves.
const PARALLEL_THRESHOLD: usize = 64;

/// Overall-similarity gap below which information richness decides the
/// ranking instead.
const RICHNESS_TIE_EPSILON: f64 = 0.02;

/// Trait seam for a match selection engine.
pub trait Matcher: Send + Sync {
    /// Run one match and return the full report.
    fn select_matches(
        &self,
        source: &SourceEntity,
        candidates: &[CandidateItem],
    ) -> Result<MatchReport, MatchError>;
}

/// Default engine: weighted field comparison with richness-aware ranking.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    config: MatchConfig,
    rules: Vec<FieldRule>,
}

impl MatchEngine {
    /// Build an engine, rejecting invalid configuration before any
    /// candidate is scored.
    pub fn new(config: MatchConfig, rules: Vec<FieldRule>) -> Result<Self, MatchError> {
        config.validate()?;
        for rule in &rules {
            rule.validate()?;
        }
        Ok(Self { config, rules })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Score, rank, and select over one candidate batch.
    pub fn select_matches(
        &self,
        source: &SourceEntity,
        candidates: &[CandidateItem],
    ) -> Result<MatchReport, MatchError> {
        let start = Instant::now();
        let span = tracing::span!(Level::DEBUG, "match.select", candidates = candidates.len());
        let _guard = span.enter();

        if candidates.is_empty() {
            debug!("empty candidate batch");
            return Ok(self.finish(Vec::new(), Vec::new(), MatchOutcome::NoCandidates, 0, start));
        }
        if source.is_blank() {
            warn!("source entity has no usable field values; nothing can match");
        }

        let scored: Vec<Result<(ComparisonResult, f64), CandidateError>> =
            if candidates.len() >= PARALLEL_THRESHOLD {
                candidates
                    .par_iter()
                    .map(|candidate| self.score_candidate(source, candidate))
                    .collect()
            } else {
                candidates
                    .iter()
                    .map(|candidate| self.score_candidate(source, candidate))
                    .collect()
            };

        let mut results: Vec<MatchResult> = Vec::with_capacity(candidates.len());
        let mut skipped: Vec<SkippedCandidate> = Vec::new();
        for (candidate, outcome) in candidates.iter().zip(scored) {
            match outcome {
                Ok((comparison, richness)) => {
                    if !comparison.required_fields_met {
                        debug!(index = candidate.index, "required fields not met; dropped");
                        continue;
                    }
                    debug!(
                        index = candidate.index,
                        overall = comparison.overall,
                        richness,
                        "candidate scored"
                    );
                    results.push(MatchResult {
                        index: candidate.index,
                        reference: candidate.reference.clone(),
                        field_scores: comparison.field_scores,
                        overall: comparison.overall,
                        meets_threshold: comparison.meets_threshold,
                        required_fields_met: true,
                        richness,
                        selected: false,
                    });
                }
                Err(err) => {
                    warn!(index = candidate.index, error = %err, "candidate skipped");
                    skipped.push(SkippedCandidate {
                        index: candidate.index,
                        reason: err.to_string(),
                    });
                }
            }
        }

        rank_results(&mut results);

        if self.config.limit_results > 0 && results.len() > self.config.limit_results {
            results.truncate(self.config.limit_results);
        }

        let eligible = results
            .iter()
            .filter(|result| result.overall >= self.config.threshold)
            .count();

        let outcome = if eligible == 0 {
            MatchOutcome::NoneAboveThreshold {
                threshold: self.config.threshold,
            }
        } else {
            let select_count = match self.config.mode {
                MatchMode::All => eligible,
                MatchMode::Best | MatchMode::FirstAboveThreshold => 1,
            };
            let mut remaining = select_count;
            for result in results.iter_mut() {
                if remaining == 0 {
                    break;
                }
                if result.overall >= self.config.threshold {
                    result.selected = true;
                    remaining -= 1;
                }
            }
            MatchOutcome::Matched {
                selected: select_count,
            }
        };

        Ok(self.finish(results, skipped, outcome, candidates.len(), start))
    }

    fn score_candidate(
        &self,
        source: &SourceEntity,
        candidate: &CandidateItem,
    ) -> Result<(ComparisonResult, f64), CandidateError> {
        let comparison = compare_entities(source, candidate, &self.rules, self.config.threshold)?;
        let richness = information_richness(&candidate.concatenated());
        Ok((comparison, richness))
    }

    fn finish(
        &self,
        results: Vec<MatchResult>,
        skipped: Vec<SkippedCandidate>,
        outcome: MatchOutcome,
        batch_size: usize,
        start: Instant,
    ) -> MatchReport {
        let best = results.iter().find(|result| result.selected).cloned();
        let latency = start.elapsed();

        info!(
            candidates = batch_size,
            ranked = results.len(),
            skipped = skipped.len(),
            outcome = %outcome,
            elapsed_micros = latency.as_micros() as u64,
            "match_complete"
        );
        if let Some(recorder) = metrics_recorder() {
            recorder.record_match(&self.config.mode, latency, batch_size, &outcome);
        }

        MatchReport {
            results,
            best,
            outcome,
            skipped,
        }
    }
}

impl Matcher for MatchEngine {
    fn select_matches(
        &self,
        source: &SourceEntity,
        candidates: &[CandidateItem],
    ) -> Result<MatchReport, MatchError> {
        MatchEngine::select_matches(self, source, candidates)
    }
}

/// One-shot entry point: validate the configuration, build an engine, and
/// run a single match.
pub fn select_matches(
    source: &SourceEntity,
    candidates: &[CandidateItem],
    rules: Vec<FieldRule>,
    config: MatchConfig,
) -> Result<MatchReport, MatchError> {
    MatchEngine::new(config, rules)?.select_matches(source, candidates)
}

/// Rank by overall similarity descending. Results whose similarity lands
/// within [`RICHNESS_TIE_EPSILON`] of their cluster's leader are a near-tie
/// and reorder by richness descending; batch index breaks exact ties so the
/// ranking is fully deterministic.
fn rank_results(results: &mut [MatchResult]) {
    results.sort_by(|a, b| {
        b.overall
            .partial_cmp(&a.overall)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.index.cmp(&b.index))
    });

    let mut start = 0;
    while start < results.len() {
        let anchor = results[start].overall;
        let mut end = start + 1;
        while end < results.len() && anchor - results[end].overall < RICHNESS_TIE_EPSILON {
            end += 1;
        }
        if end - start > 1 {
            results[start..end].sort_by(|a, b| {
                b.richness
                    .partial_cmp(&a.richness)
                    .unwrap_or(Ordering::Equal)
                    .then_with(|| a.index.cmp(&b.index))
            });
        }
        start = end;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value as JsonValue;

    fn result_with(index: usize, overall: f64, richness: f64) -> MatchResult {
        MatchResult {
            index,
            reference: JsonValue::Null,
            field_scores: Default::default(),
            overall,
            meets_threshold: true,
            required_fields_met: true,
            richness,
            selected: false,
        }
    }

    #[test]
    fn ranking_is_similarity_first() {
        let mut results = vec![
            result_with(0, 0.40, 0.9),
            result_with(1, 0.92, 0.1),
            result_with(2, 0.70, 0.5),
        ];
        rank_results(&mut results);
        let order: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn near_ties_reorder_by_richness() {
        let mut results = vec![
            result_with(0, 0.91, 0.2),
            result_with(1, 0.92, 0.1),
            result_with(2, 0.40, 0.9),
        ];
        rank_results(&mut results);
        // 0.92 and 0.91 differ by less than the epsilon; the richer one wins.
        let order: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }

    #[test]
    fn distinct_similarities_ignore_richness() {
        let mut results = vec![
            result_with(0, 0.80, 0.9),
            result_with(1, 0.92, 0.0),
        ];
        rank_results(&mut results);
        let order: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn exact_ties_fall_back_to_batch_order() {
        let mut results = vec![
            result_with(2, 0.9, 0.5),
            result_with(0, 0.9, 0.5),
            result_with(1, 0.9, 0.5),
        ];
        rank_results(&mut results);
        let order: Vec<usize> = results.iter().map(|r| r.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
