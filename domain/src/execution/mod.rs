//! Runtime state of one graph execution
//!
//! - [`status::NodeStatus`] / [`status::NodeFailure`] - per-node lifecycle and failure reasons
//! - [`policy::FailurePolicy`] - how upstream failures affect waiting nodes
//! - [`record::ExecutionRecord`] - per-request record mutated only by the executor

pub mod policy;
pub mod record;
pub mod status;
