//! Progress reporting during graph execution

pub mod reporter;
