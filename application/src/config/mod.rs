//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`ExecutionParams`] - per-call and per-request timeouts, failure policy
//! - [`GovernorConfig`] - global concurrency bound, admission mode, rate limits

pub mod execution_params;
pub mod governor_config;

pub use execution_params::ExecutionParams;
pub use governor_config::{AdmissionMode, GovernorConfig, RateLimits};
