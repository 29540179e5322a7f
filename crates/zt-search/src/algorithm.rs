//! The orchestrator-facing search algorithm contract.

use std::path::Path;

use zt_types::{Configuration, TrialMetrics, TuneResult};

/// A source of trial configurations driven by a tuning orchestrator.
///
/// The orchestrator calls [`suggest`](Self::suggest) for a new trial, runs it,
/// and reports back exactly once through
/// [`on_trial_complete`](Self::on_trial_complete).
pub trait SearchAlgorithm {
    /// Configuration for a new trial, or `None` when nothing can be proposed
    /// right now (no capacity, budget spent, optimizer waiting).
    fn suggest(&mut self, trial_id: &str) -> TuneResult<Option<Configuration>>;

    /// Intermediate result of a running trial.
    fn on_trial_result(&mut self, _trial_id: &str, _result: &TrialMetrics) {}

    /// Final notification for a trial. `result` is `None` (or empty) when the
    /// trial failed before producing metrics.
    fn on_trial_complete(
        &mut self,
        trial_id: &str,
        result: Option<&TrialMetrics>,
        error: bool,
        early_terminated: bool,
    ) -> TuneResult<()>;

    /// Persist the search state to `path`.
    fn save(&self, path: &Path) -> TuneResult<()>;

    /// Replace the search state with the one stored at `path`.
    fn restore(&mut self, path: &Path) -> TuneResult<()>;

    /// Whether no further suggestions will ever be produced.
    fn is_finished(&self) -> bool {
        false
    }

    fn name(&self) -> &str;
}
