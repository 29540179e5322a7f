//! Capability contract for black-box optimizers.

use crate::solution::Solution;

/// A black-box optimizer that always minimizes.
///
/// Whole-object snapshots are taken through serde on the concrete type, not
/// through this trait.
pub trait Optimizer {
    /// Propose one candidate, or `None` when the optimizer cannot propose
    /// right now (budget spent, waiting on pending results, ...).
    fn suggest(&mut self) -> Option<Solution>;

    /// Report the score of a previously suggested candidate. Returns the best
    /// solution found so far, if the optimizer has one.
    fn complete(&mut self, solution: &Solution, score: f64) -> Option<Solution>;

    /// Forget a pending candidate that will never be scored.
    fn release(&mut self, _solution: &Solution) {}

    /// Drop a pending candidate that will never be scored, keeping the budget
    /// it consumed.
    fn abandon(&mut self, _solution: &Solution) {}

    /// Whether the optimizer will never propose again.
    fn is_exhausted(&self) -> bool {
        false
    }

    fn name(&self) -> &str;
}
