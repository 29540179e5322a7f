//! # zt-racos
//!
//! Derivative-free optimization for tuning: a sequential racos tuner that
//! learns a region around good samples by shrinking coordinates away from bad
//! ones. Implements [`zt_types::Optimizer`].

mod parameter;
mod region;
mod rng;
mod sracos;

pub use parameter::RacosParameter;
pub use sracos::SRacosTune;
