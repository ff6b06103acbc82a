//! Answer value objects - immutable result views of a council run.
//!
//! - [`CouncilAnswer`] - simple view: the chairman's final answer only
//! - [`TaskOutput`] - one node's outcome labeled by backend and task
//! - [`DetailedCouncilAnswer`] - every node's outcome plus the final answer

use crate::execution::record::{ExecutionRecord, NodeRecord};
use crate::execution::status::NodeStatus;
use crate::graph::node::{Node, NodeRole};
use serde::{Deserialize, Serialize};

/// Simple result of asking the council
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilAnswer {
    pub question: String,
    /// RFC 3339 timestamp of when the request was admitted
    pub timestamp: String,
    pub answer: String,
    pub execution_time_seconds: f64,
}

impl CouncilAnswer {
    pub fn new(
        question: impl Into<String>,
        timestamp: impl Into<String>,
        answer: impl Into<String>,
        execution_time_seconds: f64,
    ) -> Self {
        Self {
            question: question.into(),
            timestamp: timestamp.into(),
            answer: answer.into(),
            execution_time_seconds,
        }
    }
}

/// Outcome of a single graph node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutput {
    /// Backend that produced (or failed to produce) this output
    pub agent: String,
    /// Human-readable task label, e.g. "gpt Critique"
    pub task_name: String,
    pub role: NodeRole,
    pub status: NodeStatus,
    /// Output text; empty when the node failed
    pub output: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The node ran with only part of its inputs
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl TaskOutput {
    pub fn from_node(node: &Node, entry: &NodeRecord) -> Self {
        Self {
            agent: node.backend.to_string(),
            task_name: node.task_name(),
            role: node.role,
            status: entry.status,
            output: entry.output.clone().unwrap_or_default(),
            error: entry.failure.as_ref().map(|f| f.to_string()),
            degraded: entry.degraded,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == NodeStatus::Done
    }
}

/// Detailed result: every node's outcome in fixed graph order
/// (drafts, critiques, synthesis) plus the final answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailedCouncilAnswer {
    pub question: String,
    pub timestamp: String,
    pub individual_outputs: Vec<TaskOutput>,
    /// `None` when the synthesis node never completed
    pub final_answer: Option<String>,
    pub execution_time_seconds: f64,
}

impl DetailedCouncilAnswer {
    pub fn from_record(record: &ExecutionRecord, timestamp: impl Into<String>) -> Self {
        Self {
            question: record.graph().question().content().to_string(),
            timestamp: timestamp.into(),
            individual_outputs: record
                .iter()
                .map(|(node, entry)| TaskOutput::from_node(node, entry))
                .collect(),
            final_answer: record.final_answer().map(str::to_string),
            execution_time_seconds: record.elapsed().as_secs_f64(),
        }
    }

    pub fn outputs_with_role(&self, role: NodeRole) -> impl Iterator<Item = &TaskOutput> {
        self.individual_outputs.iter().filter(move |o| o.role == role)
    }

    pub fn failed_outputs(&self) -> impl Iterator<Item = &TaskOutput> {
        self.individual_outputs.iter().filter(|o| !o.is_success())
    }

    /// Collapse into the simple view; `None` if there is no final answer
    pub fn to_simple(&self) -> Option<CouncilAnswer> {
        self.final_answer.as_ref().map(|answer| {
            CouncilAnswer::new(
                self.question.clone(),
                self.timestamp.clone(),
                answer.clone(),
                self.execution_time_seconds,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::BackendName;
    use crate::core::question::Question;
    use crate::execution::status::{FailureKind, NodeFailure};
    use crate::graph::builder::GraphBuilder;
    use std::sync::Arc;
    use std::time::Instant;

    fn finished_record() -> ExecutionRecord {
        let members = ["A", "B", "C"]
            .iter()
            .map(|s| BackendName::parse(*s).unwrap())
            .collect();
        let builder = GraphBuilder::new(members, Some(BackendName::parse("A").unwrap())).unwrap();
        let graph = Arc::new(builder.build(Question::parse("What is 2+2?").unwrap()));
        let mut rec = ExecutionRecord::new(graph, Instant::now());
        let now = Instant::now();
        for i in 0..7 {
            rec.mark_running(i, now, &[], false);
            if i == 1 {
                rec.mark_failed(i, now, NodeFailure::backend(FailureKind::EmptyResponse, "blank"));
            } else {
                rec.mark_done(i, now, format!("output {}", i));
            }
        }
        rec.finish(now);
        rec
    }

    #[test]
    fn test_detailed_answer_has_fixed_order() {
        let detailed = DetailedCouncilAnswer::from_record(&finished_record(), "2026-01-01T00:00:00Z");
        let names: Vec<_> = detailed
            .individual_outputs
            .iter()
            .map(|o| o.task_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec![
                "A Initial Answer",
                "B Initial Answer",
                "C Initial Answer",
                "A Critique",
                "B Critique",
                "C Critique",
                "Chairman Synthesis"
            ]
        );
        assert_eq!(detailed.final_answer.as_deref(), Some("output 6"));
        assert_eq!(detailed.outputs_with_role(NodeRole::Critique).count(), 3);
    }

    #[test]
    fn test_failed_output_carries_error() {
        let detailed = DetailedCouncilAnswer::from_record(&finished_record(), "ts");
        let failed: Vec<_> = detailed.failed_outputs().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].agent, "B");
        assert_eq!(failed[0].output, "");
        assert_eq!(
            failed[0].error.as_deref(),
            Some("empty_response error: blank")
        );
    }

    #[test]
    fn test_to_simple() {
        let detailed = DetailedCouncilAnswer::from_record(&finished_record(), "ts");
        let simple = detailed.to_simple().unwrap();
        assert_eq!(simple.question, "What is 2+2?");
        assert_eq!(simple.answer, "output 6");
    }

    #[test]
    fn test_json_shape() {
        let detailed = DetailedCouncilAnswer::from_record(&finished_record(), "ts");
        let json = serde_json::to_value(&detailed).unwrap();
        assert_eq!(json["individual_outputs"].as_array().unwrap().len(), 7);
        assert_eq!(json["individual_outputs"][0]["role"], "draft");
        assert_eq!(json["individual_outputs"][1]["status"], "failed");
        assert!(json["individual_outputs"][0].get("error").is_none());
    }
}
