//! Backend configuration from TOML (`[[backends]]` tables)

use council_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Providers a backend entry may name
pub const PROVIDERS: [&str; 3] = ["openai", "anthropic", "echo"];

/// One council member (or the chairman) as configured
///
/// # Example
///
/// ```toml
/// [[backends]]
/// name = "gpt"
/// provider = "openai"
/// model = "gpt-4o-mini"
/// api_key_env = "OPENAI_API_KEY"
///
/// [[backends]]
/// name = "gemini"
/// provider = "openai"
/// model = "gemini-2.0-flash"
/// base_url = "https://generativelanguage.googleapis.com/v1beta/openai"
/// api_key_env = "GEMINI_API_KEY"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// Name used for graph nodes and in answers
    pub name: String,
    /// `openai`, `anthropic` or `echo`
    pub provider: String,
    pub model: Option<String>,
    /// Overrides the provider's default endpoint
    pub base_url: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: Option<String>,
    pub max_tokens: Option<u32>,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            provider: "openai".to_string(),
            model: None,
            base_url: None,
            api_key_env: None,
            max_tokens: None,
        }
    }
}

impl FileBackendConfig {
    /// An offline echo backend
    pub fn echo(name: &str) -> Self {
        Self {
            name: name.to_string(),
            provider: "echo".to_string(),
            ..Self::default()
        }
    }

    fn needs_model(&self) -> bool {
        self.provider != "echo"
    }
}

/// Check every entry and the set as a whole
pub(super) fn validate_backends(backends: &[FileBackendConfig]) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for (index, backend) in backends.iter().enumerate() {
        let name = backend.name.trim();
        if name.is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::EmptyBackendName { index },
                format!("backends[{}]: name cannot be empty", index),
            ));
            continue;
        }

        if !seen.insert(name.to_string()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::DuplicateBackend {
                    name: name.to_string(),
                },
                format!("backends: '{}' is configured more than once", name),
            ));
        }

        if !PROVIDERS.contains(&backend.provider.as_str()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidEnumValue {
                    field: format!("backends[{}].provider", index),
                    value: backend.provider.clone(),
                    valid_values: PROVIDERS.iter().map(|p| p.to_string()).collect(),
                },
                format!(
                    "backends.{}: unknown provider '{}'",
                    name, backend.provider
                ),
            ));
        } else if backend.needs_model()
            && backend.model.as_deref().is_none_or(|m| m.trim().is_empty())
        {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::MissingModel {
                    backend: name.to_string(),
                },
                format!("backends.{}: provider '{}' requires a model", name, backend.provider),
            ));
        }
    }

    issues
}
