//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into application types.

mod backends;
mod council;
mod limits;
mod output;
mod server;

pub use backends::{FileBackendConfig, PROVIDERS};
pub use council::FileCouncilConfig;
pub use limits::FileLimitsConfig;
pub use output::FileOutputConfig;
pub use server::FileServerConfig;

use council_domain::{BackendName, ConfigIssue, ConfigIssueCode, DomainError, GraphBuilder};
use serde::{Deserialize, Serialize};

/// Members used when no backend is configured
pub const FALLBACK_MEMBERS: [&str; 3] = ["gpt", "claude", "gemini"];

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Council members, in the order their drafts are presented
    pub backends: Vec<FileBackendConfig>,
    pub council: FileCouncilConfig,
    pub limits: FileLimitsConfig,
    pub server: FileServerConfig,
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// True when no backend is configured and the offline echo council applies
    pub fn needs_fallback(&self) -> bool {
        self.backends.is_empty()
    }

    /// Fill in three echo backends (chaired by the first) if none are configured
    pub fn with_fallback_backends(mut self) -> Self {
        if self.needs_fallback() {
            self.backends = FALLBACK_MEMBERS
                .iter()
                .map(|name| FileBackendConfig::echo(name))
                .collect();
            if self.council.chairman.is_none() {
                self.council.chairman = Some(FALLBACK_MEMBERS[0].to_string());
            }
        }
        self
    }

    /// Validate the entire configuration, returning all detected issues.
    ///
    /// Checks backend entries, council membership, the chairman, enum
    /// fields and numeric limits.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = backends::validate_backends(&self.backends);

        if !self.backends.is_empty() && self.backends.len() < 2 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::TooFewBackends {
                    count: self.backends.len(),
                },
                format!(
                    "backends: at least 2 are required for cross-critique, found {}",
                    self.backends.len()
                ),
            ));
        }

        match self.council.chairman.as_deref().map(str::trim) {
            None | Some("") if !self.backends.is_empty() => {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::MissingChairman,
                    "council.chairman is not set",
                ));
            }
            Some(chairman)
                if !chairman.is_empty()
                    && !self.backends.iter().any(|b| b.name.trim() == chairman) =>
            {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::UnknownChairman {
                        name: chairman.to_string(),
                    },
                    format!(
                        "council.chairman: '{}' does not name a configured backend",
                        chairman
                    ),
                ));
            }
            _ => {}
        }

        issues.extend(self.council.to_execution_params().1);
        issues.extend(self.limits.to_governor_config().1);

        issues
    }

    /// Member and chairman names as a graph builder
    pub fn graph_builder(&self) -> Result<GraphBuilder, DomainError> {
        let members = self
            .backends
            .iter()
            .map(|b| BackendName::parse(&b.name))
            .collect::<Result<Vec<_>, _>>()?;
        let chairman = self
            .council
            .chairman
            .as_deref()
            .map(BackendName::parse)
            .transpose()?;
        GraphBuilder::new(members, chairman)
    }
}
