//! Council configuration from TOML (`[council]` section)

use council_application::ExecutionParams;
use council_domain::{ConfigIssue, ConfigIssueCode, FailurePolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw council configuration
///
/// # Example
///
/// ```toml
/// [council]
/// chairman = "gpt"
/// failure_policy = "degrade"    # or "strict"
/// backend_timeout_secs = 120    # 0 disables the per-call timeout
/// request_timeout_secs = 300
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Backend that writes the final answer
    pub chairman: Option<String>,
    pub failure_policy: String,
    pub backend_timeout_secs: u64,
    pub request_timeout_secs: Option<u64>,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        Self {
            chairman: None,
            failure_policy: FailurePolicy::default().as_str().to_string(),
            backend_timeout_secs: 120,
            request_timeout_secs: None,
        }
    }
}

impl FileCouncilConfig {
    /// Parse the failure policy, falling back to the default on bad input
    pub fn parse_failure_policy(&self) -> (FailurePolicy, Vec<ConfigIssue>) {
        match self.failure_policy.parse::<FailurePolicy>() {
            Ok(policy) => (policy, Vec::new()),
            Err(_) => (
                FailurePolicy::default(),
                vec![ConfigIssue::error(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "council.failure_policy".to_string(),
                        value: self.failure_policy.clone(),
                        valid_values: vec!["degrade".to_string(), "strict".to_string()],
                    },
                    format!(
                        "council.failure_policy: unknown value '{}'",
                        self.failure_policy
                    ),
                )],
            ),
        }
    }

    pub fn to_execution_params(&self) -> (ExecutionParams, Vec<ConfigIssue>) {
        let (policy, mut issues) = self.parse_failure_policy();

        if self.request_timeout_secs == Some(0) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::ZeroLimit {
                    field: "council.request_timeout_secs".to_string(),
                },
                "council.request_timeout_secs must be positive; omit it to wait indefinitely",
            ));
        }

        let backend_timeout =
            (self.backend_timeout_secs > 0).then(|| Duration::from_secs(self.backend_timeout_secs));
        let request_timeout = self
            .request_timeout_secs
            .filter(|&secs| secs > 0)
            .map(Duration::from_secs);

        let params = ExecutionParams::default()
            .with_failure_policy(policy)
            .with_backend_timeout(backend_timeout)
            .with_request_timeout(request_timeout);
        (params, issues)
    }
}
