//! Post-processing of completed trial results.

use zt_types::TrialMetrics;

/// Extension point invoked for every completed trial whose result is
/// processed (see `use_early_stopped_trials`).
pub trait ResultHook: Send {
    fn on_result(&mut self, _trial_id: &str, _result: &TrialMetrics) {}
}

/// Hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl ResultHook for NoopHook {}
