//! Core domain concepts shared across all subdomains.
//!
//! - [`backend::BackendName`] - identity of a council member or chairman
//! - [`question::Question`] - a validated question to pose to the council
//! - [`error::DomainError`] - domain-level errors

pub mod backend;
pub mod error;
pub mod question;
pub mod string;
