//! Offline echo backend
//!
//! Answers deterministically from its inputs so the council pipeline can
//! run without credentials or network access.

use async_trait::async_trait;
use council_application::{Backend, BackendError};
use council_domain::truncate;

pub struct EchoBackend {
    name: String,
}

impl EchoBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Backend for EchoBackend {
    async fn call(&self, prompt: &str, context: &[String]) -> Result<String, BackendError> {
        let mut reply = format!("[{}] {}", self.name, truncate(prompt, 120));
        for (i, entry) in context.iter().enumerate() {
            reply.push_str(&format!("\n  ({}) {}", i + 1, truncate(entry, 60)));
        }
        Ok(reply)
    }
}
