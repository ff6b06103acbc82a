//! Hand-written backend doubles shared by use case tests

use crate::ports::backend::{Backend, BackendError, BackendRegistry};
use async_trait::async_trait;
use council_domain::{BackendName, GraphBuilder};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One recorded backend invocation
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub prompt: String,
    pub context: Vec<String>,
}

/// What a [`MockBackend`] does when called
#[derive(Debug, Clone)]
pub(crate) enum Behavior {
    /// Reply "<stage> by <name>"
    Answer,
    Fail,
    /// Fail draft calls only; critiques and synthesis answer
    FailDrafts,
    Blank,
    Panic,
    /// Sleep, then answer
    Delay(Duration),
}

pub(crate) struct MockBackend {
    name: String,
    behavior: Behavior,
    calls: Mutex<Vec<Call>>,
}

impl MockBackend {
    pub fn new(name: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn stage(prompt: &str) -> &'static str {
        if prompt.starts_with("You are the chairman") {
            "final"
        } else if prompt.starts_with("You are a critical reviewer") {
            "critique"
        } else {
            "draft"
        }
    }

    fn reply(&self, prompt: &str) -> String {
        format!("{} by {}", Self::stage(prompt), self.name)
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn call(&self, prompt: &str, context: &[String]) -> Result<String, BackendError> {
        self.calls.lock().unwrap().push(Call {
            prompt: prompt.to_string(),
            context: context.to_vec(),
        });
        match &self.behavior {
            Behavior::Answer => Ok(self.reply(prompt)),
            Behavior::Fail => Err(BackendError::Transport("connection reset".to_string())),
            Behavior::FailDrafts if Self::stage(prompt) == "draft" => {
                Err(BackendError::Transport("connection reset".to_string()))
            }
            Behavior::FailDrafts => Ok(self.reply(prompt)),
            Behavior::Blank => Ok("   \n".to_string()),
            Behavior::Panic => panic!("adapter bug in {}", self.name),
            Behavior::Delay(delay) => {
                tokio::time::sleep(*delay).await;
                Ok(self.reply(prompt))
            }
        }
    }
}

pub(crate) fn name(s: &str) -> BackendName {
    BackendName::parse(s).unwrap()
}

/// Registry and builder for members in order; the first member chairs
pub(crate) fn council(
    members: &[(&str, Arc<MockBackend>)],
) -> (GraphBuilder, BackendRegistry) {
    let mut registry = BackendRegistry::new();
    for (member, backend) in members {
        registry.insert(name(member), Arc::clone(backend) as Arc<dyn Backend>);
    }
    let names = members.iter().map(|(member, _)| name(member)).collect();
    let builder = GraphBuilder::new(names, Some(name(members[0].0))).unwrap();
    (builder, registry)
}
