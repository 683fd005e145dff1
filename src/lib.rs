//! # fieldmatch
//!
//! ## Purpose
//!
//! `fieldmatch` is an entity-matching and comparison engine: given a
//! *source* record (named field values) and a batch of *candidate* records
//! extracted elsewhere, it scores each candidate's similarity to the source
//! across configurable fields, aggregates the field scores into one overall
//! similarity, and selects the candidate(s) to act upon.
//!
//! The engine only ever sees already-extracted strings. Acquiring
//! candidates (scraping, pagination, API calls) and acting on a selected
//! one are the caller's concerns; every candidate carries an opaque
//! back-reference that passes through the engine untouched so the action
//! layer can find its way back.
//!
//! ## Core Types
//!
//! - [`SourceEntity`]: the record being searched for.
//! - [`CandidateItem`]: one extracted record, with its batch index and
//!   opaque reference.
//! - [`FieldRule`]: per-field weight, algorithm, threshold, and
//!   required-match flag.
//! - [`SimilarityAlgorithm`]: the closed set of scoring algorithms
//!   (`exact`, `contains`, `levenshtein`, `jaccard`, `containment`,
//!   `smart`, plus caller-supplied `custom`).
//! - [`MatchConfig`]: global threshold, result cap, and [`MatchMode`].
//! - [`MatchEngine`] / [`select_matches`]: validate configuration, score
//!   the batch, rank with an information-richness tie-break, and apply the
//!   selection mode.
//! - [`MatchReport`]: ranked [`MatchResult`]s, the best selected handle,
//!   the run [`MatchOutcome`], and any skipped candidates.
//!
//! ## Example
//!
//! ```
//! use fieldmatch::{
//!     select_matches, CandidateItem, FieldRule, MatchConfig, SimilarityAlgorithm, SourceEntity,
//! };
//!
//! let source = SourceEntity::new()
//!     .with_field("name", "Acme Corp")
//!     .with_field("phone", "5551234");
//!
//! let candidates = vec![
//!     CandidateItem::new(0)
//!         .with_field("name", "ACME CORP INC")
//!         .with_field("phone", "5551234"),
//!     CandidateItem::new(1)
//!         .with_field("name", "Apex Ltd")
//!         .with_field("phone", "5559999"),
//! ];
//!
//! let rules = vec![
//!     FieldRule::new("name").with_weight(2.0).required(),
//!     FieldRule::new("phone").with_algorithm(SimilarityAlgorithm::Exact),
//! ];
//!
//! let report = select_matches(&source, &candidates, rules, MatchConfig::default())
//!     .expect("valid configuration");
//!
//! let best = report.best.expect("the first candidate clears the threshold");
//! assert_eq!(best.index, 0);
//! assert!(best.overall > 0.9);
//! ```
//!
//! ## Observability
//!
//! The engine logs through [`tracing`]; install whatever subscriber fits
//! the host process. For aggregate numbers, install a [`MatchMetrics`]
//! implementation via [`set_match_metrics`] to observe per-run latency,
//! batch size, and outcome.

pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
mod markup;
pub mod metrics;
pub mod normalize;
pub mod richness;
pub mod similarity;
pub mod types;

pub use crate::compare::compare_entities;
pub use crate::config::{FieldRule, MatchConfig, MatchMode};
pub use crate::engine::{MatchEngine, Matcher, select_matches};
pub use crate::error::{CandidateError, MatchError, ScoreError};
pub use crate::metrics::{MatchMetrics, set_match_metrics};
pub use crate::normalize::{NormalizePolicy, collapse_whitespace, normalize_text};
pub use crate::richness::information_richness;
pub use crate::similarity::{
    CustomScorer, SimilarityAlgorithm, compare_strings, containment_similarity,
    contains_similarity, exact_similarity, jaccard_similarity, levenshtein_similarity,
    smart_similarity,
};
pub use crate::types::{
    CandidateItem, ComparisonResult, MatchOutcome, MatchReport, MatchResult, SkippedCandidate,
    SourceEntity,
};
