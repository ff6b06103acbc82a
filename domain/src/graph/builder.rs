//! Task graph builder
//!
//! Produces the fixed council topology for a question:
//!
//! ```text
//! D_a   D_b   D_c        drafts (no dependencies, parallel)
//!  |  \ /  \ /  |
//! C_a   C_b   C_c        critiques (peer drafts only, never their own)
//!    \   |   /
//!        S               synthesis (chairman, waits for every critique)
//! ```

use super::CouncilGraph;
use super::node::{Node, NodeId};
use crate::core::backend::BackendName;
use crate::core::error::DomainError;
use crate::core::question::Question;
use std::collections::HashSet;

/// Builds council graphs for a validated member/chairman configuration
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    members: Vec<BackendName>,
    chairman: BackendName,
}

impl GraphBuilder {
    /// Cross-critique needs at least one peer per member, so fewer than two
    /// members is a configuration error, as is a missing chairman.
    pub fn new(
        members: Vec<BackendName>,
        chairman: Option<BackendName>,
    ) -> Result<Self, DomainError> {
        if members.len() < 2 {
            return Err(DomainError::Configuration(format!(
                "at least 2 member backends are required for cross-critique, got {}",
                members.len()
            )));
        }

        let mut seen = HashSet::new();
        for member in &members {
            if !seen.insert(member) {
                return Err(DomainError::Configuration(format!(
                    "duplicate member backend '{}'",
                    member
                )));
            }
        }

        let chairman = chairman.ok_or_else(|| {
            DomainError::Configuration("chairman backend is not set".to_string())
        })?;

        Ok(Self { members, chairman })
    }

    pub fn members(&self) -> &[BackendName] {
        &self.members
    }

    pub fn chairman(&self) -> &BackendName {
        &self.chairman
    }

    /// Number of nodes every built graph contains (2 per member + synthesis)
    pub fn node_count(&self) -> usize {
        self.members.len() * 2 + 1
    }

    /// Build the graph for one question
    pub fn build(&self, question: Question) -> CouncilGraph {
        let mut nodes = Vec::with_capacity(self.node_count());

        nodes.extend(self.members.iter().cloned().map(Node::draft));

        for member in &self.members {
            let peer_drafts = self
                .members
                .iter()
                .filter(|peer| *peer != member)
                .map(NodeId::draft)
                .collect();
            nodes.push(Node::critique(member.clone(), peer_drafts));
        }

        let critiques = self.members.iter().map(NodeId::critique).collect();
        nodes.push(Node::synthesis(self.chairman.clone(), critiques));

        // Member names are unique and every edge points backwards, so the
        // fixed topology always satisfies the graph invariants.
        match CouncilGraph::new(question, nodes) {
            Ok(graph) => graph,
            Err(e) => unreachable!("council topology is always valid: {e}"),
        }
    }
}
