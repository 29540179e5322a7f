//! Optimizer solutions and the best-solution log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One candidate point issued by an optimizer.
///
/// `id` is unique within the optimizer instance that issued it; `value` is
/// filled in once the candidate has been scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub id: u64,
    pub x: Vec<f64>,
    pub value: Option<f64>,
}

impl Solution {
    pub fn new(id: u64, x: Vec<f64>) -> Self {
        Self { id, x, value: None }
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }
}

/// A best-so-far solution as reported by the optimizer after a completion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestSolution {
    pub solution: Solution,
    pub recorded_at: DateTime<Utc>,
}

impl BestSolution {
    pub fn new(solution: Solution) -> Self {
        Self {
            solution,
            recorded_at: Utc::now(),
        }
    }
}
