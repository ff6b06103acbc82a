//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid backend name: {0}")]
    InvalidBackendName(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),
}

impl DomainError {
    /// Check if this error was caused by bad council setup rather than bad input
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DomainError::Configuration(_)
                | DomainError::InvalidBackendName(_)
                | DomainError::InvalidGraph(_)
        )
    }
}
