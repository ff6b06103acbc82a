//! Domain layer for llm-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Council
//!
//! A council is a set of member backends plus a chairman:
//!
//! - **Draft**: every member answers the question independently
//! - **Critique**: every member reviews the drafts of its peers (never its own)
//! - **Synthesis**: the chairman derives the final answer from all critiques
//!
//! ## Task Graph
//!
//! The three stages are modeled as an explicit DAG ([`CouncilGraph`]) built by
//! [`GraphBuilder`]. Runtime state for one execution lives in an
//! [`ExecutionRecord`]; partial failures are resolved by a [`FailurePolicy`].

pub mod answer;
pub mod config;
pub mod core;
pub mod execution;
pub mod graph;
pub mod prompt;

// Re-export commonly used types
pub use answer::{CouncilAnswer, DetailedCouncilAnswer, TaskOutput};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use core::{backend::BackendName, error::DomainError, question::Question, string::truncate};
pub use execution::{
    policy::{FailurePolicy, Readiness},
    record::{ExecutionRecord, NodeRecord},
    status::{FailureKind, NodeFailure, NodeStatus},
};
pub use graph::{
    CouncilGraph,
    builder::GraphBuilder,
    node::{ExecutionMode, Node, NodeId, NodeRole},
};
pub use prompt::PromptTemplate;
