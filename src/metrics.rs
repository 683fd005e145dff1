// Metrics hooks for the match engine.
//
// Callers install a global `MatchMetrics` implementation via
// [`set_match_metrics`]; every run through `MatchEngine` then reports its
// latency, batch size, and selection count. This keeps instrumentation
// decoupled from any specific metrics backend.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

use crate::config::MatchMode;
use crate::types::MatchOutcome;

/// Metrics observer for match runs.
pub trait MatchMetrics: Send + Sync {
    /// Record the outcome of one run.
    ///
    /// `mode` is the configured selection policy, `latency` the wall-clock
    /// duration of the run, `candidates` the size of the input batch, and
    /// `outcome` carries the selection count or the no-match reason.
    fn record_match(
        &self,
        mode: &MatchMode,
        latency: Duration,
        candidates: usize,
        outcome: &MatchOutcome,
    );
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn MatchMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn MatchMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn MatchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global match metrics recorder.
///
/// Typically called once during service startup so every engine instance
/// shares the same backend.
pub fn set_match_metrics(recorder: Option<Arc<dyn MatchMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().expect("match metrics lock poisoned");
    *guard = recorder;
}
