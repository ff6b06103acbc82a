//! Task graph nodes

use crate::core::backend::BackendName;
use serde::{Deserialize, Serialize};

/// Stage a node belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    /// Independent first-pass answer to the question
    Draft,
    /// Evaluation of peer drafts, excluding the member's own
    Critique,
    /// Chairman's final answer derived from all critiques
    Synthesis,
}

impl NodeRole {
    pub fn as_str(&self) -> &str {
        match self {
            NodeRole::Draft => "draft",
            NodeRole::Critique => "critique",
            NodeRole::Synthesis => "synthesis",
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            NodeRole::Draft => "Drafting",
            NodeRole::Critique => "Cross-Critique",
            NodeRole::Synthesis => "Synthesis",
        }
    }
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Whether a node may start immediately or must wait for its inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    ParallelEligible,
    AwaitDependencies,
}

/// Stable identifier of a node within one graph (e.g. `draft:gpt`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn draft(backend: &BackendName) -> Self {
        Self(format!("draft:{}", backend))
    }

    pub fn critique(backend: &BackendName) -> Self {
        Self(format!("critique:{}", backend))
    }

    pub fn synthesis() -> Self {
        Self("synthesis".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A unit of work in the council graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    /// Backend that produces this node's output
    pub backend: BackendName,
    pub role: NodeRole,
    /// Ordered dependency ids; outputs are passed to the backend in this order
    pub depends_on: Vec<NodeId>,
    pub mode: ExecutionMode,
}

impl Node {
    pub fn draft(backend: BackendName) -> Self {
        Self {
            id: NodeId::draft(&backend),
            backend,
            role: NodeRole::Draft,
            depends_on: Vec::new(),
            mode: ExecutionMode::ParallelEligible,
        }
    }

    pub fn critique(backend: BackendName, peer_drafts: Vec<NodeId>) -> Self {
        Self {
            id: NodeId::critique(&backend),
            backend,
            role: NodeRole::Critique,
            depends_on: peer_drafts,
            mode: ExecutionMode::AwaitDependencies,
        }
    }

    pub fn synthesis(chairman: BackendName, critiques: Vec<NodeId>) -> Self {
        Self {
            id: NodeId::synthesis(),
            backend: chairman,
            role: NodeRole::Synthesis,
            depends_on: critiques,
            mode: ExecutionMode::AwaitDependencies,
        }
    }

    /// Human-readable task label used in detailed results
    pub fn task_name(&self) -> String {
        match self.role {
            NodeRole::Draft => format!("{} Initial Answer", self.backend),
            NodeRole::Critique => format!("{} Critique", self.backend),
            NodeRole::Synthesis => "Chairman Synthesis".to_string(),
        }
    }

    pub fn has_dependencies(&self) -> bool {
        !self.depends_on.is_empty()
    }
}
