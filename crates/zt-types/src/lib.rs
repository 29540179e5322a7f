//! # zt-types
//!
//! Shared data model for the tuning workspace: dimension specs, parameter
//! values, solutions, trial metrics, errors and the optimizer capability
//! trait.

pub mod dimension;
pub mod errors;
pub mod metrics;
pub mod optimizer;
pub mod solution;
pub mod value;

pub use dimension::*;
pub use errors::*;
pub use metrics::*;
pub use optimizer::*;
pub use solution::*;
pub use value::*;
