//! Execution record for one graph run

use super::status::{NodeFailure, NodeStatus};
use crate::graph::CouncilGraph;
use crate::graph::node::{Node, NodeId};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Runtime state of a single node
#[derive(Debug, Clone)]
pub struct NodeRecord {
    pub status: NodeStatus,
    pub started_at: Option<Instant>,
    pub finished_at: Option<Instant>,
    /// Output slot, filled once on success
    pub output: Option<String>,
    pub failure: Option<NodeFailure>,
    /// Dependencies whose outputs were actually passed to the backend
    pub inputs: Vec<NodeId>,
    /// True when some dependency failed and the node ran on partial input
    pub degraded: bool,
}

impl NodeRecord {
    fn pending() -> Self {
        Self {
            status: NodeStatus::Pending,
            started_at: None,
            finished_at: None,
            output: None,
            failure: None,
            inputs: Vec::new(),
            degraded: false,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => Some(end.saturating_duration_since(start)),
            _ => None,
        }
    }
}

/// Binds a graph to the runtime state of one execution.
///
/// Status transitions are one-way: `Pending -> Running -> Done | Failed`,
/// or `Pending -> Failed` for propagated failures. Transitions from any
/// other state are ignored so an output slot is filled at most once.
#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    graph: Arc<CouncilGraph>,
    nodes: Vec<NodeRecord>,
    admitted_at: Instant,
    finished_at: Option<Instant>,
}

impl ExecutionRecord {
    pub fn new(graph: Arc<CouncilGraph>, admitted_at: Instant) -> Self {
        let nodes = (0..graph.len()).map(|_| NodeRecord::pending()).collect();
        Self {
            graph,
            nodes,
            admitted_at,
            finished_at: None,
        }
    }

    pub fn graph(&self) -> &CouncilGraph {
        &self.graph
    }

    pub fn entry(&self, index: usize) -> &NodeRecord {
        &self.nodes[index]
    }

    pub fn entry_by_id(&self, id: &NodeId) -> Option<&NodeRecord> {
        self.graph.index_of(id).map(|i| &self.nodes[i])
    }

    pub fn status(&self, index: usize) -> NodeStatus {
        self.nodes[index].status
    }

    /// Nodes paired with their runtime state, in graph order
    pub fn iter(&self) -> impl Iterator<Item = (&Node, &NodeRecord)> {
        self.graph.nodes().iter().zip(self.nodes.iter())
    }

    /// `(position, status)` of every dependency of `index`
    pub fn dependency_statuses(&self, index: usize) -> Vec<(usize, NodeStatus)> {
        self.graph
            .dependencies(index)
            .iter()
            .map(|&d| (d, self.nodes[d].status))
            .collect()
    }

    pub fn mark_running(&mut self, index: usize, at: Instant, inputs: &[usize], degraded: bool) {
        let ids: Vec<NodeId> = inputs
            .iter()
            .map(|&i| self.graph.node(i).id.clone())
            .collect();
        let entry = &mut self.nodes[index];
        if entry.status != NodeStatus::Pending {
            return;
        }
        entry.status = NodeStatus::Running;
        entry.started_at = Some(at);
        entry.inputs = ids;
        entry.degraded = degraded;
    }

    pub fn mark_done(&mut self, index: usize, at: Instant, output: String) {
        let entry = &mut self.nodes[index];
        if entry.status != NodeStatus::Running {
            return;
        }
        entry.status = NodeStatus::Done;
        entry.finished_at = Some(at);
        entry.output = Some(output);
    }

    pub fn mark_failed(&mut self, index: usize, at: Instant, failure: NodeFailure) {
        let entry = &mut self.nodes[index];
        if entry.status.is_terminal() {
            return;
        }
        entry.status = NodeStatus::Failed;
        entry.finished_at = Some(at);
        entry.failure = Some(failure);
    }

    /// Fail a pending node because the given dependency positions failed
    pub fn mark_propagated(&mut self, index: usize, at: Instant, upstream: &[usize]) {
        if self.nodes[index].status != NodeStatus::Pending {
            return;
        }
        let upstream: Vec<NodeId> = upstream
            .iter()
            .map(|&i| self.graph.node(i).id.clone())
            .collect();
        self.mark_failed(index, at, NodeFailure::Propagated { upstream });
    }

    /// Outputs of the given positions, in order; failed inputs are skipped
    pub fn outputs_of(&self, positions: &[usize]) -> Vec<String> {
        positions
            .iter()
            .filter_map(|&i| self.nodes[i].output.clone())
            .collect()
    }

    pub fn pending(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.status == NodeStatus::Pending)
            .map(|(i, _)| i)
    }

    pub fn is_complete(&self) -> bool {
        self.nodes.iter().all(|n| n.status.is_terminal())
    }

    pub fn finish(&mut self, at: Instant) {
        self.finished_at = Some(at);
    }

    /// Overall status: success iff the synthesis node is done
    pub fn succeeded(&self) -> bool {
        self.graph
            .synthesis_index()
            .is_some_and(|i| self.nodes[i].status == NodeStatus::Done)
    }

    /// The chairman's synthesized answer, if it was produced
    pub fn final_answer(&self) -> Option<&str> {
        self.graph
            .synthesis_index()
            .and_then(|i| self.nodes[i].output.as_deref())
    }

    /// Reason the synthesis node failed, if it did
    pub fn synthesis_failure(&self) -> Option<&NodeFailure> {
        self.graph
            .synthesis_index()
            .and_then(|i| self.nodes[i].failure.as_ref())
    }

    pub fn admitted_at(&self) -> Instant {
        self.admitted_at
    }

    /// Wall-clock time from admission to completion (or to now if still running)
    pub fn elapsed(&self) -> Duration {
        self.finished_at
            .unwrap_or_else(Instant::now)
            .saturating_duration_since(self.admitted_at)
    }

    pub fn failed_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| n.status == NodeStatus::Failed)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::BackendName;
    use crate::core::question::Question;
    use crate::execution::status::FailureKind;
    use crate::graph::builder::GraphBuilder;

    fn record() -> ExecutionRecord {
        let members = ["A", "B", "C"]
            .iter()
            .map(|s| BackendName::parse(*s).unwrap())
            .collect();
        let builder = GraphBuilder::new(members, Some(BackendName::parse("A").unwrap())).unwrap();
        let graph = builder.build(Question::parse("What is 2+2?").unwrap());
        ExecutionRecord::new(Arc::new(graph), Instant::now())
    }

    #[test]
    fn test_new_record_is_all_pending() {
        let rec = record();
        assert_eq!(rec.pending().count(), 7);
        assert!(!rec.is_complete());
        assert!(!rec.succeeded());
    }

    #[test]
    fn test_output_slot_filled_once() {
        let mut rec = record();
        let now = Instant::now();
        rec.mark_running(0, now, &[], false);
        rec.mark_done(0, now, "4".to_string());
        rec.mark_done(0, now, "5".to_string());
        rec.mark_failed(0, now, NodeFailure::backend(FailureKind::Timeout, "late"));

        assert_eq!(rec.status(0), NodeStatus::Done);
        assert_eq!(rec.entry(0).output.as_deref(), Some("4"));
        assert!(rec.entry(0).failure.is_none());
    }

    #[test]
    fn test_done_requires_running() {
        let mut rec = record();
        rec.mark_done(1, Instant::now(), "skipped start".to_string());
        assert_eq!(rec.status(1), NodeStatus::Pending);
    }

    #[test]
    fn test_propagated_failure_names_upstream() {
        let mut rec = record();
        let now = Instant::now();
        rec.mark_propagated(3, now, &[1, 2]);
        let failure = rec.entry(3).failure.clone().unwrap();
        assert_eq!(
            failure,
            NodeFailure::Propagated {
                upstream: vec![NodeId::new("draft:B"), NodeId::new("draft:C")]
            }
        );
    }

    #[test]
    fn test_inputs_and_outputs() {
        let mut rec = record();
        let now = Instant::now();
        for i in 0..3 {
            rec.mark_running(i, now, &[], false);
        }
        rec.mark_done(1, now, "B says 4".to_string());
        rec.mark_failed(2, now, NodeFailure::backend(FailureKind::Transport, "reset"));
        rec.mark_running(3, now, &[1], true);

        assert_eq!(rec.outputs_of(&[1, 2]), vec!["B says 4".to_string()]);
        assert_eq!(rec.entry(3).inputs, vec![NodeId::new("draft:B")]);
        assert!(rec.entry(3).degraded);
        assert_eq!(rec.failed_count(), 1);
    }

    #[test]
    fn test_success_tracks_synthesis() {
        let mut rec = record();
        let now = Instant::now();
        rec.mark_running(6, now, &[], false);
        rec.mark_done(6, now, "Final: 4".to_string());
        assert!(rec.succeeded());
        assert_eq!(rec.final_answer(), Some("Final: 4"));
    }
}
