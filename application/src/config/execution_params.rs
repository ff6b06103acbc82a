//! Execution parameters for executor and service control.
//!
//! [`ExecutionParams`] groups the static parameters that control how
//! [`TaskExecutor`](crate::use_cases::execute_graph::TaskExecutor) runs a
//! graph and how long [`CouncilService`](crate::use_cases::ask_council::CouncilService)
//! waits for it. These are application-layer concerns, not domain policy.

use council_domain::FailurePolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Executor and request control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionParams {
    /// Upper bound for a single backend call; a stalled call becomes a timeout failure.
    pub backend_timeout: Option<Duration>,
    /// Upper bound for a whole request; the caller stops waiting after this.
    pub request_timeout: Option<Duration>,
    /// How waiting nodes react to failed dependencies.
    pub failure_policy: FailurePolicy,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            backend_timeout: Some(Duration::from_secs(120)),
            request_timeout: None,
            failure_policy: FailurePolicy::Degrade,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_backend_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.backend_timeout = timeout;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}
