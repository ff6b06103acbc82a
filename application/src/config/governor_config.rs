//! Concurrency governor configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What happens to a request when every admission ticket is taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdmissionMode {
    /// Fail immediately with a capacity error
    #[default]
    Reject,
    /// Wait for a ticket up to the configured admission wait
    Block,
}

impl AdmissionMode {
    pub fn as_str(&self) -> &str {
        match self {
            AdmissionMode::Reject => "reject",
            AdmissionMode::Block => "block",
        }
    }
}

impl std::str::FromStr for AdmissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" => Ok(AdmissionMode::Reject),
            "block" => Ok(AdmissionMode::Block),
            other => Err(format!(
                "unknown admission mode '{}', expected 'reject' or 'block'",
                other
            )),
        }
    }
}

/// Per-caller request budgets within a rolling window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimits {
    /// Simple-answer requests allowed per window
    pub simple: u32,
    /// Detailed-answer requests allowed per window (stricter by default)
    pub detailed: u32,
    pub window: Duration,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            simple: 10,
            detailed: 5,
            window: Duration::from_secs(60 * 60),
        }
    }
}

/// Configuration of the [`ConcurrencyGovernor`](crate::governor::ConcurrencyGovernor)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorConfig {
    /// Graph executions allowed to hold a ticket at once, system-wide
    pub max_concurrent: usize,
    pub mode: AdmissionMode,
    /// Longest a request waits for a ticket in [`AdmissionMode::Block`]
    pub admission_wait: Duration,
    pub rate_limits: RateLimits,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 5,
            mode: AdmissionMode::Reject,
            admission_wait: Duration::from_secs(30),
            rate_limits: RateLimits::default(),
        }
    }
}

impl GovernorConfig {
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    pub fn with_mode(mut self, mode: AdmissionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_admission_wait(mut self, wait: Duration) -> Self {
        self.admission_wait = wait;
        self
    }

    pub fn with_rate_limits(mut self, limits: RateLimits) -> Self {
        self.rate_limits = limits;
        self
    }
}
