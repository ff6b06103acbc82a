//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod ask_council;
pub mod execute_graph;

#[cfg(test)]
pub(crate) mod test_support;
