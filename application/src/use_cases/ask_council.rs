//! Ask Council use case
//!
//! Handles one question end to end: validation, rate check, graph
//! construction, governed execution on a worker task, and response assembly.

use super::execute_graph::TaskExecutor;
use crate::config::ExecutionParams;
use crate::governor::{AdmissionError, ConcurrencyGovernor, EndpointKind, GovernorStatus};
use crate::ports::backend::BackendRegistry;
use crate::ports::progress::ProgressNotifier;
use chrono::{SecondsFormat, Utc};
use council_domain::{
    BackendName, CouncilAnswer, DetailedCouncilAnswer, DomainError, ExecutionRecord, GraphBuilder,
    Question,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

/// Errors returned to callers of the council
#[derive(Error, Debug)]
pub enum CouncilError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error(transparent)]
    Admission(#[from] AdmissionError),

    #[error("Council failed to produce an answer: {reason}")]
    GraphFailure {
        reason: String,
        /// Every node's outcome, present when the caller asked for detail
        partial: Option<Box<DetailedCouncilAnswer>>,
    },

    #[error("Request timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Execution aborted: {0}")]
    Aborted(String),
}

impl CouncilError {
    /// Whether the same request may succeed later without changes
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CouncilError::Admission(_) | CouncilError::Timeout(_) | CouncilError::GraphFailure { .. }
        )
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            CouncilError::Admission(e) => e.retry_after(),
            _ => None,
        }
    }

    /// Short machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CouncilError::InvalidInput(_) => "invalid_input",
            CouncilError::Configuration(_) => "configuration",
            CouncilError::Admission(AdmissionError::CapacityExceeded { .. }) => "capacity_exceeded",
            CouncilError::Admission(AdmissionError::RateLimitExceeded { .. }) => {
                "rate_limit_exceeded"
            }
            CouncilError::GraphFailure { .. } => "graph_failure",
            CouncilError::Timeout(_) => "timeout",
            CouncilError::Aborted(_) => "aborted",
        }
    }
}

impl From<DomainError> for CouncilError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidQuestion(msg) => CouncilError::InvalidInput(msg),
            other => CouncilError::Configuration(other.to_string()),
        }
    }
}

/// Input for the AskCouncil use case
#[derive(Debug, Clone)]
pub struct AskCouncilInput {
    pub question: String,
    /// Identity the rate window is tracked under (client address, user name)
    pub caller: String,
    pub detail: bool,
}

impl AskCouncilInput {
    pub fn new(question: impl Into<String>, caller: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            caller: caller.into(),
            detail: false,
        }
    }

    pub fn detailed(mut self) -> Self {
        self.detail = true;
        self
    }

    fn endpoint_kind(&self) -> EndpointKind {
        if self.detail {
            EndpointKind::Detailed
        } else {
            EndpointKind::Simple
        }
    }
}

/// Successful council response in the requested view
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CouncilResponse {
    Simple(CouncilAnswer),
    Detailed(DetailedCouncilAnswer),
}

impl CouncilResponse {
    pub fn answer(&self) -> Option<&str> {
        match self {
            CouncilResponse::Simple(a) => Some(&a.answer),
            CouncilResponse::Detailed(d) => d.final_answer.as_deref(),
        }
    }
}

/// Entry point for asking the council
pub struct CouncilService {
    builder: GraphBuilder,
    registry: Arc<BackendRegistry>,
    governor: Arc<ConcurrencyGovernor>,
    params: ExecutionParams,
    executor: Arc<TaskExecutor>,
}

impl CouncilService {
    /// Every member and the chairman must have a registered backend
    pub fn new(
        builder: GraphBuilder,
        registry: BackendRegistry,
        governor: Arc<ConcurrencyGovernor>,
        params: ExecutionParams,
    ) -> Result<Self, CouncilError> {
        let missing: Vec<&str> = builder
            .members()
            .iter()
            .chain(std::iter::once(builder.chairman()))
            .filter(|name| !registry.contains(name))
            .map(BackendName::as_str)
            .collect();
        if !missing.is_empty() {
            return Err(CouncilError::Configuration(format!(
                "no backend registered for: {}",
                missing.join(", ")
            )));
        }

        let registry = Arc::new(registry);
        let executor = Arc::new(TaskExecutor::new(Arc::clone(&registry), params.clone()));
        Ok(Self {
            builder,
            registry,
            governor,
            params,
            executor,
        })
    }

    pub fn with_progress(mut self, progress: Arc<dyn ProgressNotifier>) -> Self {
        self.executor = Arc::new(
            TaskExecutor::new(Arc::clone(&self.registry), self.params.clone())
                .with_progress(progress),
        );
        self
    }

    pub fn members(&self) -> &[BackendName] {
        self.builder.members()
    }

    pub fn chairman(&self) -> &BackendName {
        self.builder.chairman()
    }

    pub fn params(&self) -> &ExecutionParams {
        &self.params
    }

    pub fn governor(&self) -> &ConcurrencyGovernor {
        &self.governor
    }

    pub fn status(&self, caller: &str) -> GovernorStatus {
        self.governor.status(caller)
    }

    pub async fn ask_simple(
        &self,
        question: impl Into<String>,
        caller: impl Into<String>,
    ) -> Result<CouncilAnswer, CouncilError> {
        match self.ask(AskCouncilInput::new(question, caller)).await? {
            CouncilResponse::Simple(answer) => Ok(answer),
            CouncilResponse::Detailed(detailed) => detailed
                .to_simple()
                .ok_or_else(|| CouncilError::Aborted("missing final answer".to_string())),
        }
    }

    pub async fn ask_detailed(
        &self,
        question: impl Into<String>,
        caller: impl Into<String>,
    ) -> Result<DetailedCouncilAnswer, CouncilError> {
        match self
            .ask(AskCouncilInput::new(question, caller).detailed())
            .await?
        {
            CouncilResponse::Detailed(detailed) => Ok(detailed),
            CouncilResponse::Simple(_) => {
                Err(CouncilError::Aborted("unexpected simple response".to_string()))
            }
        }
    }

    /// Ask the council one question
    pub async fn ask(&self, input: AskCouncilInput) -> Result<CouncilResponse, CouncilError> {
        let kind = input.endpoint_kind();
        let question = Question::parse(input.question)?;

        self.governor.check_rate(&input.caller, kind)?;

        let graph = Arc::new(self.builder.build(question));
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        info!(
            caller = input.caller.as_str(),
            kind = kind.as_str(),
            nodes = graph.len(),
            "Council request accepted"
        );

        let executor = Arc::clone(&self.executor);
        let governor = Arc::clone(&self.governor);
        let worker = tokio::spawn(async move { executor.execute(graph, &governor).await });

        let joined = match self.params.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, worker).await {
                Ok(joined) => joined,
                Err(_) => {
                    // The worker keeps its ticket until the graph finishes
                    warn!(
                        caller = input.caller.as_str(),
                        timeout_secs = limit.as_secs(),
                        "Council request timed out"
                    );
                    return Err(CouncilError::Timeout(limit));
                }
            },
            None => worker.await,
        };

        let record = joined.map_err(|e| CouncilError::Aborted(e.to_string()))??;
        Self::respond(&record, timestamp, kind)
    }

    fn respond(
        record: &ExecutionRecord,
        timestamp: String,
        kind: EndpointKind,
    ) -> Result<CouncilResponse, CouncilError> {
        let detailed = DetailedCouncilAnswer::from_record(record, timestamp);

        if !record.succeeded() {
            let reason = record
                .synthesis_failure()
                .map(ToString::to_string)
                .unwrap_or_else(|| "synthesis did not complete".to_string());
            warn!(reason = reason.as_str(), "Council graph failed");
            let partial = (kind == EndpointKind::Detailed).then(|| Box::new(detailed));
            return Err(CouncilError::GraphFailure { reason, partial });
        }

        match kind {
            EndpointKind::Detailed => Ok(CouncilResponse::Detailed(detailed)),
            EndpointKind::Simple => detailed
                .to_simple()
                .map(CouncilResponse::Simple)
                .ok_or_else(|| CouncilError::Aborted("missing final answer".to_string())),
        }
    }
}
