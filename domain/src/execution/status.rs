//! Node lifecycle and failure reasons

use crate::graph::node::NodeId;
use serde::{Deserialize, Serialize};

/// Status of a single node during execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Pending,
    Running,
    Done,
    Failed,
}

impl NodeStatus {
    pub fn as_str(&self) -> &str {
        match self {
            NodeStatus::Pending => "pending",
            NodeStatus::Running => "running",
            NodeStatus::Done => "done",
            NodeStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeStatus::Done | NodeStatus::Failed)
    }
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a backend call failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    Transport,
    EmptyResponse,
    /// The backend adapter panicked while handling the call
    Aborted,
}

impl FailureKind {
    pub fn as_str(&self) -> &str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Transport => "transport",
            FailureKind::EmptyResponse => "empty_response",
            FailureKind::Aborted => "aborted",
        }
    }
}

/// Why a node ended in [`NodeStatus::Failed`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeFailure {
    /// The node's own backend call failed
    Backend { kind: FailureKind, message: String },
    /// The node was never launched because its inputs failed
    Propagated { upstream: Vec<NodeId> },
}

impl NodeFailure {
    pub fn backend(kind: FailureKind, message: impl Into<String>) -> Self {
        NodeFailure::Backend {
            kind,
            message: message.into(),
        }
    }

    pub fn is_propagated(&self) -> bool {
        matches!(self, NodeFailure::Propagated { .. })
    }
}

impl std::fmt::Display for NodeFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeFailure::Backend { kind, message } => {
                write!(f, "{} error: {}", kind.as_str(), message)
            }
            NodeFailure::Propagated { upstream } => {
                let ids: Vec<&str> = upstream.iter().map(NodeId::as_str).collect();
                write!(f, "dependency failed: {}", ids.join(", "))
            }
        }
    }
}
