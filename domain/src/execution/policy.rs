//! Partial-failure policy for nodes that wait on dependencies

use super::status::NodeStatus;
use serde::{Deserialize, Serialize};

/// How a waiting node reacts to failed dependencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Run with whatever inputs succeeded; fail only if every input failed
    #[default]
    Degrade,
    /// Fail as soon as any input fails
    Strict,
}

/// Outcome of evaluating a pending node against its dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Some dependency has not reached a terminal status yet
    Waiting,
    /// The node can launch with the listed dependency positions as inputs
    Ready { inputs: Vec<usize>, degraded: bool },
    /// The node can never run; the listed dependencies failed
    Doomed { upstream: Vec<usize> },
}

impl FailurePolicy {
    pub fn as_str(&self) -> &str {
        match self {
            FailurePolicy::Degrade => "degrade",
            FailurePolicy::Strict => "strict",
        }
    }

    /// Decide whether a node with the given `(position, status)` dependencies
    /// may start. A node without dependencies is always ready.
    pub fn evaluate(&self, deps: &[(usize, NodeStatus)]) -> Readiness {
        let failed: Vec<usize> = deps
            .iter()
            .filter(|(_, s)| *s == NodeStatus::Failed)
            .map(|(i, _)| *i)
            .collect();

        if *self == FailurePolicy::Strict && !failed.is_empty() {
            return Readiness::Doomed { upstream: failed };
        }

        if !deps.iter().all(|(_, s)| s.is_terminal()) {
            return Readiness::Waiting;
        }

        let inputs: Vec<usize> = deps
            .iter()
            .filter(|(_, s)| *s == NodeStatus::Done)
            .map(|(i, _)| *i)
            .collect();

        if inputs.is_empty() && !deps.is_empty() {
            return Readiness::Doomed { upstream: failed };
        }

        Readiness::Ready {
            degraded: !failed.is_empty(),
            inputs,
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "degrade" => Ok(FailurePolicy::Degrade),
            "strict" => Ok(FailurePolicy::Strict),
            other => Err(format!(
                "unknown failure policy '{}', expected 'degrade' or 'strict'",
                other
            )),
        }
    }
}
