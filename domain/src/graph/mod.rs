//! Council task graph
//!
//! A [`CouncilGraph`] is the immutable DAG for one question: draft nodes
//! feed critique nodes, which feed the single synthesis node. Dependencies
//! are resolved to positions once at construction so the executor can work
//! with plain indices.

pub mod builder;
pub mod node;

use crate::core::error::DomainError;
use crate::core::question::Question;
use node::{Node, NodeId, NodeRole};
use std::collections::{HashMap, VecDeque};

/// Immutable task graph bound to one question
#[derive(Debug, Clone)]
pub struct CouncilGraph {
    question: Question,
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    deps: Vec<Vec<usize>>,
}

impl CouncilGraph {
    /// Create a graph from arbitrary nodes, validating ids, edges and acyclicity
    pub fn new(question: Question, nodes: Vec<Node>) -> Result<Self, DomainError> {
        let mut index = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if index.insert(node.id.clone(), i).is_some() {
                return Err(DomainError::InvalidGraph(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
        }

        let mut deps = Vec::with_capacity(nodes.len());
        for node in &nodes {
            let mut resolved = Vec::with_capacity(node.depends_on.len());
            for dep in &node.depends_on {
                let Some(&pos) = index.get(dep) else {
                    return Err(DomainError::InvalidGraph(format!(
                        "node {} depends on unknown node {}",
                        node.id, dep
                    )));
                };
                resolved.push(pos);
            }
            deps.push(resolved);
        }

        let graph = Self {
            question,
            nodes,
            index,
            deps,
        };
        if graph.topological_order().is_none() {
            return Err(DomainError::InvalidGraph("graph contains a cycle".to_string()));
        }
        Ok(graph)
    }

    pub fn question(&self) -> &Question {
        &self.question
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// Positions of the nodes `index` depends on, in declared order
    pub fn dependencies(&self, index: usize) -> &[usize] {
        &self.deps[index]
    }

    /// Position of the synthesis node, if the graph has one
    pub fn synthesis_index(&self) -> Option<usize> {
        self.nodes.iter().position(|n| n.role == NodeRole::Synthesis)
    }

    pub fn nodes_with_role(&self, role: NodeRole) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.role == role)
    }

    /// All `(dependency, dependent)` edges, for topology comparison
    pub fn edges(&self) -> Vec<(NodeId, NodeId)> {
        self.nodes
            .iter()
            .flat_map(|n| n.depends_on.iter().map(|d| (d.clone(), n.id.clone())))
            .collect()
    }

    /// Kahn's algorithm; `None` if a cycle exists
    pub fn topological_order(&self) -> Option<Vec<usize>> {
        let mut in_degree: Vec<usize> = self.deps.iter().map(Vec::len).collect();
        let mut dependents = vec![Vec::new(); self.nodes.len()];
        for (i, deps) in self.deps.iter().enumerate() {
            for &d in deps {
                dependents[d].push(i);
            }
        }

        let mut queue: VecDeque<usize> = (0..self.nodes.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(i) = queue.pop_front() {
            order.push(i);
            for &next in &dependents[i] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    queue.push_back(next);
                }
            }
        }

        (order.len() == self.nodes.len()).then_some(order)
    }
}
