//! Tuning parameters for the sequential racos optimizer.

use serde::{Deserialize, Serialize};
use zt_types::ConfigError;

/// Parameters controlling sampling budget and region learning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacosParameter {
    /// Total number of candidates the optimizer may issue.
    pub budget: usize,
    /// Number of uniform samples drawn before region learning starts.
    pub train_size: usize,
    /// How many of the best samples form the positive set.
    pub positive_size: usize,
    /// Probability of sampling from a learned region instead of the whole space.
    pub probability: f64,
    /// Dimensions re-sampled inside a learned region. `None` picks a default
    /// from the dimension count.
    pub uncertain_bits: Option<usize>,
    /// Redraws allowed when a candidate duplicates a known one.
    pub max_distinct_retries: usize,
    pub seed: Option<u64>,
}

impl RacosParameter {
    pub fn new(budget: usize) -> Self {
        Self {
            budget,
            train_size: 22,
            positive_size: 2,
            probability: 0.99,
            uncertain_bits: None,
            max_distinct_retries: 100,
            seed: None,
        }
    }

    pub fn with_train_size(mut self, n: usize) -> Self {
        self.train_size = n;
        self
    }

    pub fn with_positive_size(mut self, n: usize) -> Self {
        self.positive_size = n;
        self
    }

    pub fn with_probability(mut self, p: f64) -> Self {
        self.probability = p;
        self
    }

    pub fn with_uncertain_bits(mut self, bits: usize) -> Self {
        self.uncertain_bits = Some(bits);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget == 0 {
            return Err(ConfigError::InvalidBudget);
        }
        if self.train_size == 0 {
            return Err(invalid("train_size", "must be positive"));
        }
        if self.positive_size == 0 {
            return Err(invalid("positive_size", "must be positive"));
        }
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(invalid("probability", "must lie in [0, 1]"));
        }
        if self.uncertain_bits == Some(0) {
            return Err(invalid("uncertain_bits", "must be positive"));
        }
        Ok(())
    }

    /// Initial sample count, never more than the budget.
    pub fn effective_train_size(&self) -> usize {
        self.train_size.min(self.budget)
    }

    pub fn effective_positive_size(&self) -> usize {
        self.positive_size.min(self.effective_train_size())
    }

    /// Uncertain bits for a space of `dims` dimensions.
    pub fn effective_uncertain_bits(&self, dims: usize) -> usize {
        let bits = self.uncertain_bits.unwrap_or(match dims {
            0..=100 => 1,
            101..=1000 => 2,
            _ => 3,
        });
        bits.clamp(1, dims.max(1))
    }
}

fn invalid(parameter: &str, message: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        parameter: parameter.to_string(),
        message: message.to_string(),
    }
}
