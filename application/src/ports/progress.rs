//! Progress notification port
//!
//! Defines the interface for reporting progress during graph execution.

use council_domain::{CouncilGraph, ExecutionRecord, Node, NodeRecord};

/// Callback for progress updates during graph execution
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console bars, plain text, nothing at all).
/// Calls arrive from the executor's task, one at a time per graph.
pub trait ProgressNotifier: Send + Sync {
    /// Called once before any node is launched
    fn on_graph_start(&self, graph: &CouncilGraph);

    /// Called when a node's backend call is launched
    fn on_node_start(&self, _node: &Node) {}

    /// Called when a node reaches a terminal status, including propagated failures
    fn on_node_complete(&self, node: &Node, entry: &NodeRecord);

    /// Called once every node is terminal
    fn on_graph_complete(&self, _record: &ExecutionRecord) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {
    fn on_graph_start(&self, _graph: &CouncilGraph) {}
    fn on_node_complete(&self, _node: &Node, _entry: &NodeRecord) {}
}
