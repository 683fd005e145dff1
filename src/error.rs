//! Error types produced by the matching engine.
//!
//! The engine distinguishes two failure surfaces. [`MatchError`] covers
//! configuration problems and is raised before any candidate is scored, so a
//! bad setup can never produce partial results. [`ScoreError`] (and its
//! field-annotated wrapper [`CandidateError`]) covers failures while scoring a
//! single candidate; those never abort a batch — the affected candidate is
//! recorded in the report's skip list and the run continues.
//!
//! A batch that runs to completion without finding anything is *not* an
//! error; see [`MatchOutcome`](crate::types::MatchOutcome).

use thiserror::Error;

/// Errors raised when validating engine configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// Invalid global or per-field configuration.
    #[error("invalid match config: {0}")]
    InvalidConfig(String),
}

/// Errors raised while scoring a pair of strings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoreError {
    /// A caller-supplied comparator returned an error.
    #[error("custom comparator failed: {0}")]
    Custom(String),
    /// A comparator produced NaN or an infinite value.
    #[error("comparator produced a non-finite score")]
    NonFinite,
}

/// A scoring failure annotated with the field that produced it.
///
/// Carried in [`MatchReport::skipped`](crate::types::MatchReport) so callers
/// can see which candidates were dropped and why.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("field `{field}`: {source}")]
pub struct CandidateError {
    /// Name of the field whose comparison failed.
    pub field: String,
    /// The underlying scoring error.
    #[source]
    pub source: ScoreError,
}
