//! Application layer for llm-council
//!
//! This crate contains the orchestration engine: the task executor, the
//! concurrency governor and the council service, plus the ports that
//! backend adapters and progress reporters implement.
//! It depends only on the domain layer.

pub mod config;
pub mod governor;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{AdmissionMode, ExecutionParams, GovernorConfig, RateLimits};
pub use governor::{
    AdmissionError, AdmissionTicket, ConcurrencyGovernor, EndpointKind, GovernorStatus,
};
pub use ports::{
    backend::{Backend, BackendError, BackendRegistry},
    progress::{NoProgress, ProgressNotifier},
};
pub use use_cases::ask_council::{AskCouncilInput, CouncilError, CouncilResponse, CouncilService};
pub use use_cases::execute_graph::TaskExecutor;
