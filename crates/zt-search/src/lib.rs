//! # zt-search
//!
//! Search-algorithm adapter for hyperparameter tuning. [`ZoSearch`] turns a
//! dimension spec into optimizer candidates, hands them out as trial
//! configurations under a concurrency cap, and feeds completed results back
//! so the optimizer can propose better ones.

mod algorithm;
mod config;
mod hook;
mod search;

pub use algorithm::SearchAlgorithm;
pub use config::{Algorithm, FailurePolicy, ResolvedConfig, ZoSearchConfig};
pub use hook::{NoopHook, ResultHook};
pub use search::{LiveTrial, ZoSearch};
