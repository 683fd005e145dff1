//! Text normalization policies.
//!
//! [`NormalizePolicy`] controls how raw field values are turned into
//! comparable plain text before any similarity algorithm runs. Policies are
//! cheap to clone, serde-friendly, and purely declarative: the same input and
//! policy always produce the same output, with no I/O or locale dependence.
//!
//! Normalization is idempotent: feeding the output of [`normalize_text`] back
//! through the same policy returns it unchanged. Downstream scoring relies on
//! this to re-normalize defensively without drift.

use serde::{Deserialize, Serialize};
use unicode_categories::UnicodeCategories;
use unicode_normalization::UnicodeNormalization;

use crate::markup;

/// Flags controlling text normalization.
///
/// The default policy (lowercase + trim + collapse whitespace) matches what
/// every bundled algorithm expects as a baseline. [`markup_aware`] adds
/// markup extraction for values scraped out of HTML, and [`aggressive`]
/// enables everything for the most forgiving comparisons.
///
/// [`markup_aware`]: NormalizePolicy::markup_aware
/// [`aggressive`]: NormalizePolicy::aggressive
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizePolicy {
    /// Apply Unicode lowercasing.
    #[serde(default = "NormalizePolicy::default_on")]
    pub lowercase: bool,
    /// Trim leading and trailing whitespace.
    #[serde(default = "NormalizePolicy::default_on")]
    pub trim: bool,
    /// Collapse whitespace runs to single spaces.
    #[serde(default = "NormalizePolicy::default_on")]
    pub collapse_whitespace: bool,
    /// Replace Unicode punctuation with spaces.
    #[serde(default)]
    pub strip_punctuation: bool,
    /// Drop combining accent marks (NFD decompose, filter, recompose).
    #[serde(default)]
    pub strip_diacritics: bool,
    /// Treat the input as markup: drop non-visible elements, turn block
    /// boundaries into line breaks, strip tags, decode character references.
    #[serde(default)]
    pub extract_text_only: bool,
}

impl NormalizePolicy {
    pub(crate) fn default_on() -> bool {
        true
    }

    /// Markup-stripping profile used by the `smart` and `containment`
    /// algorithms.
    pub fn markup_aware() -> Self {
        Self {
            extract_text_only: true,
            ..Self::default()
        }
    }

    /// Everything on: markup extraction, punctuation and diacritic
    /// stripping on top of the defaults.
    pub fn aggressive() -> Self {
        Self {
            strip_punctuation: true,
            strip_diacritics: true,
            extract_text_only: true,
            ..Self::default()
        }
    }
}

impl Default for NormalizePolicy {
    fn default() -> Self {
        Self {
            lowercase: true,
            trim: true,
            collapse_whitespace: true,
            strip_punctuation: false,
            strip_diacritics: false,
            extract_text_only: false,
        }
    }
}

/// Normalize `input` under `policy`.
///
/// Steps run in a fixed order: markup extraction, diacritic stripping,
/// lowercasing, punctuation replacement, whitespace collapsing, trimming.
/// When markup extraction is active, whitespace collapsing preserves the
/// line breaks the extractor emitted; otherwise all whitespace collapses to
/// single spaces.
pub fn normalize_text(input: &str, policy: &NormalizePolicy) -> String {
    let mut text = if policy.extract_text_only {
        markup::extract_text(input)
    } else {
        input.to_string()
    };

    if policy.strip_diacritics {
        text = strip_diacritics(&text);
    }
    if policy.lowercase {
        text = text.to_lowercase();
    }
    if policy.strip_punctuation {
        text = text
            .chars()
            .map(|ch| if ch.is_punctuation() { ' ' } else { ch })
            .collect();
    }
    if policy.collapse_whitespace {
        text = if policy.extract_text_only {
            markup::tidy_whitespace(&text)
        } else {
            collapse_whitespace(&text)
        };
    }
    if policy.trim {
        text = text.trim().to_string();
    }
    text
}

/// Collapses repeated whitespace, trims edges, and normalizes newlines to
/// single spaces.
///
/// Deterministic and standalone; useful for callers that need
/// whitespace-normalized text without a full [`NormalizePolicy`] pass.
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}

/// NFD-decompose, drop nonspacing marks, recompose. "Café" becomes "Cafe".
fn strip_diacritics(text: &str) -> String {
    text.nfd().filter(|ch| !ch.is_mark_nonspacing()).nfc().collect()
}
