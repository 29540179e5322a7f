use thiserror::Error;

/// Main error type for the tuning workspace
#[derive(Error, Debug)]
pub enum TuneError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Trial error: {0}")]
    Trial(#[from] TrialError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Construction-time validation errors.
///
/// These are fatal: the caller has to fix the configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("No search algorithm specified")]
    MissingAlgorithm,

    #[error("Unsupported algorithm: {name} (expected one of: sracos, asracos)")]
    UnsupportedAlgorithm { name: String },

    #[error("No sample budget specified")]
    MissingBudget,

    #[error("Sample budget must be positive")]
    InvalidBudget,

    #[error("Dimension spec is empty")]
    EmptyDimensions,

    #[error("Invalid dimension {name}: {message}")]
    InvalidDimension { name: String, message: String },

    #[error("Dimension declared more than once: {name}")]
    DuplicateDimension { name: String },

    #[error("max_concurrent must be positive, got {value}")]
    InvalidMaxConcurrent { value: usize },

    #[error("Mode must be 'min' or 'max', got '{mode}'")]
    InvalidMode { mode: String },

    #[error("Invalid optimizer parameter {parameter}: {message}")]
    InvalidParameter { parameter: String, message: String },
}

/// Trial lifecycle errors. Each one indicates caller misuse of the
/// `suggest` / `on_trial_complete` protocol.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrialError {
    #[error("Trial is not live: {trial_id}")]
    UnknownTrial { trial_id: String },

    #[error("Trial is already live: {trial_id}")]
    AlreadyLive { trial_id: String },

    #[error("Result for trial {trial_id} has no metric '{metric}'")]
    MissingMetric { trial_id: String, metric: String },
}

/// Result type alias for tuning operations
pub type TuneResult<T> = Result<T, TuneError>;
