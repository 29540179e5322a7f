//! Construction parameters for the zeroth-order search adapter.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use zt_racos::RacosParameter;
use zt_types::{ConfigError, DimensionSpec, Mode, TuneResult, DEFAULT_METRIC};

/// Optimization algorithms the adapter can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Sequential racos.
    SRacos,
    /// Asynchronous sequential racos.
    ASRacos,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SRacos => "sracos",
            Self::ASRacos => "asracos",
        }
    }
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sracos" => Ok(Self::SRacos),
            "asracos" => Ok(Self::ASRacos),
            _ => Err(ConfigError::UnsupportedAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to tell the optimizer about a trial that ended without a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Nothing. The candidate keeps its share of the budget.
    #[default]
    Ignore,
    /// The optimizer forgets the candidate and its budget is refunded.
    Release,
    /// Report `value` as the trial's raw metric.
    Penalize { value: f64 },
}

/// Adapter configuration as supplied by the caller (or a JSON file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoSearchConfig {
    /// Algorithm name, case-insensitive.
    pub algorithm: Option<String>,

    /// Total number of configurations the optimizer may propose.
    pub budget: Option<usize>,

    /// Ordered search space.
    pub dimensions: DimensionSpec,

    /// Maximum number of simultaneously live trials.
    pub max_concurrent: usize,

    /// Result key holding the objective value.
    pub metric: String,

    /// "min" or "max".
    pub mode: String,

    /// Whether results of early-terminated trials reach the result hook.
    pub use_early_stopped_trials: bool,

    pub failure_policy: FailurePolicy,

    /// Seed for the optimizer's random stream.
    pub seed: Option<u64>,

    /// Override for the optimizer's initial sample count.
    pub train_size: Option<usize>,
}

impl Default for ZoSearchConfig {
    fn default() -> Self {
        Self {
            algorithm: Some(Algorithm::ASRacos.as_str().to_string()),
            budget: None,
            dimensions: DimensionSpec::new(),
            max_concurrent: 10,
            metric: DEFAULT_METRIC.to_string(),
            mode: Mode::Min.to_string(),
            use_early_stopped_trials: true,
            failure_policy: FailurePolicy::Ignore,
            seed: None,
            train_size: None,
        }
    }
}

impl ZoSearchConfig {
    pub fn new(budget: usize, dimensions: DimensionSpec) -> Self {
        Self {
            budget: Some(budget),
            dimensions,
            ..Self::default()
        }
    }

    pub fn with_algorithm(mut self, name: &str) -> Self {
        self.algorithm = Some(name.to_string());
        self
    }

    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    pub fn with_objective(mut self, metric: &str, mode: &str) -> Self {
        self.metric = metric.to_string();
        self.mode = mode.to_string();
        self
    }

    pub fn with_early_stopped_trials(mut self, use_them: bool) -> Self {
        self.use_early_stopped_trials = use_them;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_train_size(mut self, n: usize) -> Self {
        self.train_size = Some(n);
        self
    }

    /// Load a configuration from a JSON file. Missing fields take their
    /// defaults; validation happens when the adapter is built.
    pub fn from_json_file(path: impl AsRef<Path>) -> TuneResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Check every construction parameter and resolve the string-typed ones.
    pub fn validate(&self) -> Result<ResolvedConfig, ConfigError> {
        let algorithm: Algorithm = self
            .algorithm
            .as_deref()
            .ok_or(ConfigError::MissingAlgorithm)?
            .parse()?;

        let budget = self.budget.ok_or(ConfigError::MissingBudget)?;
        if budget == 0 {
            return Err(ConfigError::InvalidBudget);
        }

        self.dimensions.validate()?;

        if self.max_concurrent == 0 {
            return Err(ConfigError::InvalidMaxConcurrent {
                value: self.max_concurrent,
            });
        }

        let mode: Mode = self.mode.parse()?;

        if let FailurePolicy::Penalize { value } = self.failure_policy {
            if !value.is_finite() {
                return Err(ConfigError::InvalidParameter {
                    parameter: "failure_policy".to_string(),
                    message: "penalty must be finite".to_string(),
                });
            }
        }

        Ok(ResolvedConfig {
            algorithm,
            budget,
            dimensions: self.dimensions.clone(),
            max_concurrent: self.max_concurrent,
            metric: self.metric.clone(),
            mode,
            use_early_stopped_trials: self.use_early_stopped_trials,
            failure_policy: self.failure_policy,
            seed: self.seed,
            train_size: self.train_size,
        })
    }
}

/// A validated configuration with its string fields resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub algorithm: Algorithm,
    pub budget: usize,
    pub dimensions: DimensionSpec,
    pub max_concurrent: usize,
    pub metric: String,
    pub mode: Mode,
    pub use_early_stopped_trials: bool,
    pub failure_policy: FailurePolicy,
    pub seed: Option<u64>,
    pub train_size: Option<usize>,
}

impl ResolvedConfig {
    /// Parameters for the racos tuner behind both supported algorithms.
    pub fn racos_parameter(&self) -> RacosParameter {
        let mut parameter = RacosParameter::new(self.budget);
        if let Some(n) = self.train_size {
            parameter = parameter.with_train_size(n);
        }
        if let Some(seed) = self.seed {
            parameter = parameter.with_seed(seed);
        }
        parameter
    }
}
