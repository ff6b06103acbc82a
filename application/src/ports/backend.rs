//! Backend port
//!
//! Defines the single capability every model provider implements.

use async_trait::async_trait;
use council_domain::{BackendName, FailureKind};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors a backend call can end with
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Timeout")]
    Timeout,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Empty response")]
    EmptyResponse,
}

impl BackendError {
    pub fn kind(&self) -> FailureKind {
        match self {
            BackendError::Timeout => FailureKind::Timeout,
            BackendError::Transport(_) => FailureKind::Transport,
            BackendError::EmptyResponse => FailureKind::EmptyResponse,
        }
    }
}

/// A language-model backend
///
/// Implementations (adapters) live in the infrastructure layer. A backend
/// holds no per-request state and is shared read-only across concurrent
/// graph executions.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Answer `prompt`, given prior outputs as ordered `context`
    async fn call(&self, prompt: &str, context: &[String]) -> Result<String, BackendError>;
}

/// Backends addressable by name
#[derive(Clone, Default)]
pub struct BackendRegistry {
    backends: HashMap<BackendName, Arc<dyn Backend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend; a later registration under the same name replaces the earlier one
    pub fn register(mut self, name: BackendName, backend: Arc<dyn Backend>) -> Self {
        self.backends.insert(name, backend);
        self
    }

    pub fn insert(&mut self, name: BackendName, backend: Arc<dyn Backend>) {
        self.backends.insert(name, backend);
    }

    pub fn get(&self, name: &BackendName) -> Option<Arc<dyn Backend>> {
        self.backends.get(name).cloned()
    }

    pub fn contains(&self, name: &BackendName) -> bool {
        self.backends.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.backends.keys().map(BackendName::as_str).collect();
        names.sort_unstable();
        f.debug_struct("BackendRegistry").field("backends", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl Backend for Fixed {
        async fn call(&self, _prompt: &str, _context: &[String]) -> Result<String, BackendError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_registry_lookup() {
        let name = BackendName::parse("gpt").unwrap();
        let registry = BackendRegistry::new().register(name.clone(), Arc::new(Fixed("4")));

        assert!(registry.contains(&name));
        let backend = registry.get(&name).unwrap();
        assert_eq!(backend.call("2+2?", &[]).await.unwrap(), "4");
        assert!(registry.get(&BackendName::parse("claude").unwrap()).is_none());
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(BackendError::Timeout.kind(), FailureKind::Timeout);
        assert_eq!(
            BackendError::Transport("reset".to_string()).kind(),
            FailureKind::Transport
        );
        assert_eq!(BackendError::EmptyResponse.kind(), FailureKind::EmptyResponse);
    }
}
