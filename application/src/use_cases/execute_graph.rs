//! Execute Graph use case
//!
//! Runs a council graph with a ready-set scheduler: every node whose
//! dependencies allow it is launched as its own task, and the ready set is
//! recomputed each time a running node finishes.

use crate::config::ExecutionParams;
use crate::governor::{AdmissionError, ConcurrencyGovernor};
use crate::ports::backend::{Backend, BackendError, BackendRegistry};
use crate::ports::progress::{NoProgress, ProgressNotifier};
use council_domain::{
    CouncilGraph, ExecutionRecord, FailureKind, NodeFailure, NodeRole, PromptTemplate, Readiness,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

type NodeResult = (usize, Result<String, NodeFailure>);

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Executes council graphs against registered backends
pub struct TaskExecutor {
    registry: Arc<BackendRegistry>,
    params: ExecutionParams,
    progress: Arc<dyn ProgressNotifier>,
}

impl TaskExecutor {
    pub fn new(registry: Arc<BackendRegistry>, params: ExecutionParams) -> Self {
        Self {
            registry,
            params,
            progress: Arc::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn params(&self) -> &ExecutionParams {
        &self.params
    }

    /// Acquire a ticket, run the graph to completion, release the ticket
    pub async fn execute(
        &self,
        graph: Arc<CouncilGraph>,
        governor: &ConcurrencyGovernor,
    ) -> Result<ExecutionRecord, AdmissionError> {
        let ticket = governor.admit().await?;
        let record = self.run(graph).await;
        drop(ticket);
        Ok(record)
    }

    /// Run every node of `graph` until all are terminal
    pub async fn run(&self, graph: Arc<CouncilGraph>) -> ExecutionRecord {
        let mut record = ExecutionRecord::new(Arc::clone(&graph), now());
        let mut running: JoinSet<NodeResult> = JoinSet::new();

        info!(
            nodes = graph.len(),
            policy = self.params.failure_policy.as_str(),
            "Executing council graph"
        );
        self.progress.on_graph_start(&graph);

        loop {
            self.launch_ready(&mut record, &mut running);

            let Some(joined) = running.join_next().await else {
                break;
            };

            match joined {
                Ok((index, Ok(output))) => {
                    record.mark_done(index, now(), output);
                    let node = graph.node(index);
                    info!(
                        node = node.id.as_str(),
                        duration_ms = record.entry(index).duration().map(|d| d.as_millis() as u64),
                        "Node done"
                    );
                    self.progress.on_node_complete(node, record.entry(index));
                }
                Ok((index, Err(failure))) => {
                    let node = graph.node(index);
                    warn!(node = node.id.as_str(), error = %failure, "Node failed");
                    record.mark_failed(index, now(), failure);
                    self.progress.on_node_complete(node, record.entry(index));
                }
                Err(e) => {
                    warn!("Node task join error: {}", e);
                }
            }
        }

        // A lost task leaves its node running; close it out so the record is complete
        for index in 0..graph.len() {
            if !record.status(index).is_terminal() {
                record.mark_failed(
                    index,
                    now(),
                    NodeFailure::backend(FailureKind::Aborted, "task ended without a result"),
                );
                self.progress
                    .on_node_complete(graph.node(index), record.entry(index));
            }
        }

        record.finish(now());
        info!(
            succeeded = record.succeeded(),
            failed_nodes = record.failed_count(),
            elapsed_ms = record.elapsed().as_millis() as u64,
            "Council graph finished"
        );
        self.progress.on_graph_complete(&record);
        record
    }

    /// Launch ready nodes and propagate failures until nothing changes
    fn launch_ready(&self, record: &mut ExecutionRecord, running: &mut JoinSet<NodeResult>) {
        loop {
            let mut changed = false;
            let pending: Vec<usize> = record.pending().collect();

            for index in pending {
                let deps = record.dependency_statuses(index);
                match self.params.failure_policy.evaluate(&deps) {
                    Readiness::Waiting => {}
                    Readiness::Doomed { upstream } => {
                        record.mark_propagated(index, now(), &upstream);
                        let node = record.graph().node(index).clone();
                        warn!(
                            node = node.id.as_str(),
                            upstream = upstream.len(),
                            "Node failed by propagation"
                        );
                        self.progress.on_node_complete(&node, record.entry(index));
                        changed = true;
                    }
                    Readiness::Ready { inputs, degraded } => {
                        if !self.launch(record, running, index, &inputs, degraded) {
                            changed = true;
                        }
                    }
                }
            }

            if !changed {
                break;
            }
        }
    }

    /// Spawn one node's backend call; returns false if the node failed instead
    fn launch(
        &self,
        record: &mut ExecutionRecord,
        running: &mut JoinSet<NodeResult>,
        index: usize,
        inputs: &[usize],
        degraded: bool,
    ) -> bool {
        let node = record.graph().node(index).clone();
        record.mark_running(index, now(), inputs, degraded);

        let Some(backend) = self.registry.get(&node.backend) else {
            record.mark_failed(
                index,
                now(),
                NodeFailure::backend(
                    FailureKind::Transport,
                    format!("backend '{}' is not registered", node.backend),
                ),
            );
            self.progress.on_node_complete(&node, record.entry(index));
            return false;
        };

        let question = record.graph().question().content();
        let authors: Vec<&str> = inputs
            .iter()
            .map(|&i| record.graph().node(i).backend.as_str())
            .collect();
        let prompt = match node.role {
            NodeRole::Draft => PromptTemplate::draft(question),
            NodeRole::Critique => PromptTemplate::critique(question, &authors),
            NodeRole::Synthesis => PromptTemplate::synthesis(question, &authors),
        };
        let context = record.outputs_of(inputs);

        debug!(
            node = node.id.as_str(),
            backend = node.backend.as_str(),
            inputs = inputs.len(),
            degraded,
            "Launching node"
        );
        self.progress.on_node_start(&node);

        let call_timeout = self.params.backend_timeout;
        running.spawn(async move {
            let result = call_backend(backend, prompt, context, call_timeout).await;
            (index, result)
        });
        true
    }
}

/// Invoke a backend once, turning every way it can go wrong into a node failure
async fn call_backend(
    backend: Arc<dyn Backend>,
    prompt: String,
    context: Vec<String>,
    call_timeout: Option<Duration>,
) -> Result<String, NodeFailure> {
    let call = async {
        match call_timeout {
            Some(limit) => tokio::time::timeout(limit, backend.call(&prompt, &context))
                .await
                .unwrap_or(Err(BackendError::Timeout)),
            None => backend.call(&prompt, &context).await,
        }
    };

    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(Ok(text)) if text.trim().is_empty() => Err(NodeFailure::backend(
            FailureKind::EmptyResponse,
            "backend returned an empty response",
        )),
        Ok(Ok(text)) => Ok(text),
        Ok(Err(BackendError::Transport(message))) => {
            Err(NodeFailure::backend(FailureKind::Transport, message))
        }
        Ok(Err(e)) => Err(NodeFailure::backend(e.kind(), e.to_string())),
        Err(panic) => Err(NodeFailure::backend(
            FailureKind::Aborted,
            format!("backend panicked: {}", panic_message(panic.as_ref())),
        )),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GovernorConfig;
    use crate::use_cases::test_support::{Behavior, MockBackend, council};
    use council_domain::{DetailedCouncilAnswer, FailurePolicy, NodeId, NodeStatus, Question};

    fn executor(registry: BackendRegistry, params: ExecutionParams) -> TaskExecutor {
        TaskExecutor::new(Arc::new(registry), params)
    }

    fn graph(builder: &council_domain::GraphBuilder, q: &str) -> Arc<CouncilGraph> {
        Arc::new(builder.build(Question::parse(q).unwrap()))
    }

    fn status(record: &ExecutionRecord, id: &str) -> NodeStatus {
        record.entry_by_id(&NodeId::new(id)).unwrap().status
    }

    #[tokio::test]
    async fn test_three_member_council_end_to_end() {
        let a = MockBackend::new("A", Behavior::Answer);
        let b = MockBackend::new("B", Behavior::Answer);
        let c = MockBackend::new("C", Behavior::Answer);
        let (builder, registry) = council(&[("A", a.clone()), ("B", b.clone()), ("C", c.clone())]);

        let record = executor(registry, ExecutionParams::default())
            .run(graph(&builder, "What is 2+2?"))
            .await;

        assert!(record.succeeded());
        assert_eq!(record.final_answer(), Some("final by A"));
        assert_eq!(record.failed_count(), 0);

        // A drafts, critiques and chairs; B and C draft and critique
        assert_eq!(a.calls().len(), 3);
        assert_eq!(b.calls().len(), 2);
        assert_eq!(c.calls().len(), 2);

        // A's critique sees exactly the other drafts, in member order
        let critique = a
            .calls()
            .into_iter()
            .find(|call| call.prompt.starts_with("You are a critical reviewer"))
            .unwrap();
        assert_eq!(critique.context, vec!["draft by B", "draft by C"]);
        assert!(critique.prompt.contains("in this order: B, C."));

        let synthesis = a
            .calls()
            .into_iter()
            .find(|call| call.prompt.starts_with("You are the chairman"))
            .unwrap();
        assert_eq!(
            synthesis.context,
            vec!["critique by A", "critique by B", "critique by C"]
        );
    }

    #[tokio::test]
    async fn test_dependencies_finish_before_dependents_start() {
        let (builder, registry) = council(&[
            ("A", MockBackend::new("A", Behavior::Answer)),
            ("B", MockBackend::new("B", Behavior::Answer)),
            ("C", MockBackend::new("C", Behavior::Answer)),
            ("D", MockBackend::new("D", Behavior::Answer)),
        ]);

        let record = executor(registry, ExecutionParams::default())
            .run(graph(&builder, "Order?"))
            .await;

        for (index, (node, entry)) in record.iter().enumerate() {
            let started = entry.started_at.unwrap();
            for &dep in record.graph().dependencies(index) {
                let finished = record.entry(dep).finished_at.unwrap();
                assert!(started >= finished, "{} started before {}", node.id, dep);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_independent_nodes_run_concurrently() {
        let delay = Behavior::Delay(Duration::from_secs(1));
        let (builder, registry) = council(&[
            ("A", MockBackend::new("A", delay.clone())),
            ("B", MockBackend::new("B", delay.clone())),
            ("C", MockBackend::new("C", delay)),
        ]);

        let started = tokio::time::Instant::now();
        let record = executor(registry, ExecutionParams::default())
            .run(graph(&builder, "Parallel?"))
            .await;

        assert!(record.succeeded());
        // Three stages of one second each, not seven sequential calls
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[tokio::test]
    async fn test_degrade_runs_dependents_on_partial_input() {
        let a = MockBackend::new("A", Behavior::Answer);
        let b = MockBackend::new("B", Behavior::Fail);
        let c = MockBackend::new("C", Behavior::Answer);
        let (builder, registry) = council(&[("A", a.clone()), ("B", b), ("C", c)]);

        let record = executor(registry, ExecutionParams::default())
            .run(graph(&builder, "What is 2+2?"))
            .await;

        assert_eq!(status(&record, "draft:B"), NodeStatus::Failed);
        assert_eq!(status(&record, "critique:B"), NodeStatus::Failed);
        assert_eq!(status(&record, "critique:A"), NodeStatus::Done);
        assert_eq!(status(&record, "critique:C"), NodeStatus::Done);

        let critique_a = record.entry_by_id(&NodeId::new("critique:A")).unwrap();
        assert!(critique_a.degraded);
        assert_eq!(critique_a.inputs, vec![NodeId::new("draft:C")]);

        let synthesis = record.entry_by_id(&NodeId::synthesis()).unwrap();
        assert!(synthesis.degraded);
        assert!(record.succeeded());

        let chairman_call = a
            .calls()
            .into_iter()
            .find(|call| call.prompt.starts_with("You are the chairman"))
            .unwrap();
        assert_eq!(chairman_call.context, vec!["critique by A", "critique by C"]);
    }

    #[tokio::test]
    async fn test_single_failed_draft_degrades_only_its_readers() {
        let a = MockBackend::new("A", Behavior::Answer);
        let b = MockBackend::new("B", Behavior::FailDrafts);
        let c = MockBackend::new("C", Behavior::Answer);
        let (builder, registry) = council(&[("A", a.clone()), ("B", b.clone()), ("C", c)]);

        let record = executor(registry, ExecutionParams::default())
            .run(graph(&builder, "What is 2+2?"))
            .await;

        assert_eq!(status(&record, "draft:B"), NodeStatus::Failed);
        for id in ["critique:A", "critique:B", "critique:C"] {
            assert_eq!(status(&record, id), NodeStatus::Done, "{}", id);
        }

        let critique_a = record.entry_by_id(&NodeId::new("critique:A")).unwrap();
        assert!(critique_a.degraded);
        assert_eq!(critique_a.inputs, vec![NodeId::new("draft:C")]);
        let critique_c = record.entry_by_id(&NodeId::new("critique:C")).unwrap();
        assert!(critique_c.degraded);
        assert_eq!(critique_c.inputs, vec![NodeId::new("draft:A")]);
        let critique_b = record.entry_by_id(&NodeId::new("critique:B")).unwrap();
        assert!(!critique_b.degraded);
        assert_eq!(
            critique_b.inputs,
            vec![NodeId::new("draft:A"), NodeId::new("draft:C")]
        );

        let critique_call = b
            .calls()
            .into_iter()
            .find(|call| call.prompt.starts_with("You are a critical reviewer"))
            .unwrap();
        assert_eq!(critique_call.context, vec!["draft by A", "draft by C"]);

        let synthesis = record.entry_by_id(&NodeId::synthesis()).unwrap();
        assert!(!synthesis.degraded);
        assert!(record.succeeded());
        assert_eq!(record.final_answer(), Some("final by A"));

        let detailed = DetailedCouncilAnswer::from_record(&record, "2026-01-01T00:00:00.000Z");
        assert_eq!(detailed.individual_outputs.len(), 7);
        let failed: Vec<&str> = detailed
            .failed_outputs()
            .map(|output| output.task_name.as_str())
            .collect();
        assert_eq!(failed, vec!["B Initial Answer"]);
        assert_eq!(detailed.final_answer.as_deref(), Some("final by A"));
    }

    #[tokio::test]
    async fn test_strict_propagates_failures() {
        let (builder, registry) = council(&[
            ("A", MockBackend::new("A", Behavior::Answer)),
            ("B", MockBackend::new("B", Behavior::Fail)),
            ("C", MockBackend::new("C", Behavior::Answer)),
        ]);
        let params = ExecutionParams::default().with_failure_policy(FailurePolicy::Strict);

        let record = executor(registry, params)
            .run(graph(&builder, "Strict?"))
            .await;

        assert!(!record.succeeded());
        let critique_a = record.entry_by_id(&NodeId::new("critique:A")).unwrap();
        assert_eq!(
            critique_a.failure,
            Some(NodeFailure::Propagated {
                upstream: vec![NodeId::new("draft:B")]
            })
        );
        assert!(critique_a.started_at.is_none());
        assert!(record.synthesis_failure().unwrap().is_propagated());
    }

    #[tokio::test]
    async fn test_all_drafts_failing_dooms_everything() {
        let a = MockBackend::new("A", Behavior::Fail);
        let b = MockBackend::new("B", Behavior::Fail);
        let (builder, registry) = council(&[("A", a.clone()), ("B", b.clone())]);

        let record = executor(registry, ExecutionParams::default())
            .run(graph(&builder, "Anyone?"))
            .await;

        assert!(!record.succeeded());
        assert!(record.is_complete());
        assert_eq!(record.failed_count(), 5);
        // Only the drafts reached a backend
        assert_eq!(a.calls().len(), 1);
        assert_eq!(b.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_blank_response_is_empty_response_failure() {
        let (builder, registry) = council(&[
            ("A", MockBackend::new("A", Behavior::Answer)),
            ("B", MockBackend::new("B", Behavior::Blank)),
        ]);

        let record = executor(registry, ExecutionParams::default())
            .run(graph(&builder, "Blank?"))
            .await;

        let draft_b = record.entry_by_id(&NodeId::new("draft:B")).unwrap();
        assert!(matches!(
            draft_b.failure,
            Some(NodeFailure::Backend {
                kind: FailureKind::EmptyResponse,
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_backend_times_out() {
        let (builder, registry) = council(&[
            ("A", MockBackend::new("A", Behavior::Answer)),
            ("B", MockBackend::new("B", Behavior::Delay(Duration::from_secs(3600)))),
            ("C", MockBackend::new("C", Behavior::Answer)),
        ]);
        let params = ExecutionParams::default().with_backend_timeout(Some(Duration::from_secs(5)));

        let record = executor(registry, params)
            .run(graph(&builder, "Slow?"))
            .await;

        let draft_b = record.entry_by_id(&NodeId::new("draft:B")).unwrap();
        assert!(matches!(
            draft_b.failure,
            Some(NodeFailure::Backend {
                kind: FailureKind::Timeout,
                ..
            })
        ));
        assert!(record.succeeded());
    }

    #[tokio::test]
    async fn test_panicking_backend_is_contained_and_ticket_released() {
        let (builder, registry) = council(&[
            ("A", MockBackend::new("A", Behavior::Answer)),
            ("B", MockBackend::new("B", Behavior::Panic)),
            ("C", MockBackend::new("C", Behavior::Answer)),
        ]);
        let governor = ConcurrencyGovernor::new(GovernorConfig::default());

        let record = executor(registry, ExecutionParams::default())
            .execute(graph(&builder, "Panic?"), &governor)
            .await
            .unwrap();

        let draft_b = record.entry_by_id(&NodeId::new("draft:B")).unwrap();
        assert!(matches!(
            draft_b.failure,
            Some(NodeFailure::Backend {
                kind: FailureKind::Aborted,
                ..
            })
        ));
        assert!(record.succeeded());
        assert_eq!(governor.tickets_acquired(), 1);
        assert_eq!(governor.tickets_released(), 1);
        assert_eq!(governor.active(), 0);
        assert!(record.iter().all(|(_, entry)| entry.status.is_terminal()));
    }

    #[tokio::test]
    async fn test_unregistered_backend_fails_its_nodes() {
        let (builder, _) = council(&[
            ("A", MockBackend::new("A", Behavior::Answer)),
            ("B", MockBackend::new("B", Behavior::Answer)),
        ]);
        let registry = BackendRegistry::new().register(
            council_domain::BackendName::parse("A").unwrap(),
            MockBackend::new("A", Behavior::Answer),
        );

        let record = executor(registry, ExecutionParams::default())
            .run(graph(&builder, "Missing?"))
            .await;

        assert_eq!(status(&record, "draft:B"), NodeStatus::Failed);
        assert!(record.is_complete());
    }

    #[tokio::test]
    async fn test_execute_rejects_without_capacity() {
        let (builder, registry) = council(&[
            ("A", MockBackend::new("A", Behavior::Answer)),
            ("B", MockBackend::new("B", Behavior::Answer)),
        ]);
        let governor = ConcurrencyGovernor::new(GovernorConfig::default().with_max_concurrent(1));
        let _held = governor.admit().await.unwrap();

        let err = executor(registry, ExecutionParams::default())
            .execute(graph(&builder, "Full?"), &governor)
            .await
            .unwrap_err();

        assert_eq!(err, AdmissionError::CapacityExceeded { active: 1, max: 1 });
    }
}
