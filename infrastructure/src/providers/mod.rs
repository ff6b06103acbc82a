//! Backend provider adapters
//!
//! Each configured `[[backends]]` entry becomes one [`Backend`] built by
//! [`BackendFactory`] according to its provider.

pub mod anthropic;
pub mod echo;
pub mod openai;

use crate::config::FileBackendConfig;
use anthropic::AnthropicBackend;
use council_application::{Backend, BackendError, BackendRegistry};
use council_domain::{BackendName, DomainError};
use echo::EchoBackend;
use openai::OpenAiBackend;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Echo,
}

impl ProviderKind {
    pub fn as_str(&self) -> &str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Echo => "echo",
        }
    }

    fn default_base_url(&self) -> &str {
        match self {
            ProviderKind::OpenAi => "https://api.openai.com/v1",
            ProviderKind::Anthropic => "https://api.anthropic.com",
            ProviderKind::Echo => "",
        }
    }

    fn default_api_key_env(&self) -> Option<&str> {
        match self {
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::Echo => None,
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "echo" => Ok(ProviderKind::Echo),
            other => Err(format!("unknown provider '{}'", other)),
        }
    }
}

/// Errors raised while turning configuration into backends
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Backend '{backend}': {message}")]
    UnknownProvider { backend: String, message: String },

    #[error("Backend '{backend}': provider '{provider}' requires a model")]
    MissingModel { backend: String, provider: String },

    #[error("Backend '{backend}': environment variable {env} is not set")]
    MissingApiKey { backend: String, env: String },

    #[error("Backend '{backend}': failed to build HTTP client: {message}")]
    Client { backend: String, message: String },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Builds backends from configuration
pub struct BackendFactory {
    /// Applied to the HTTP client; the executor enforces its own per-call bound
    request_timeout: Option<Duration>,
}

impl BackendFactory {
    pub fn new(request_timeout: Option<Duration>) -> Self {
        Self { request_timeout }
    }

    pub fn build(&self, config: &FileBackendConfig) -> Result<Arc<dyn Backend>, ProviderError> {
        let name = config.name.trim().to_string();
        let kind: ProviderKind =
            config
                .provider
                .parse()
                .map_err(|message| ProviderError::UnknownProvider {
                    backend: name.clone(),
                    message,
                })?;

        if kind == ProviderKind::Echo {
            debug!(backend = name.as_str(), "Using offline echo backend");
            return Ok(Arc::new(EchoBackend::new(name)));
        }

        let model = config
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ProviderError::MissingModel {
                backend: name.clone(),
                provider: kind.as_str().to_string(),
            })?
            .to_string();

        // An explicitly named variable must be set; the provider default is optional
        let api_key = match config.api_key_env.as_deref() {
            Some(env) => Some(std::env::var(env).map_err(|_| ProviderError::MissingApiKey {
                backend: name.clone(),
                env: env.to_string(),
            })?),
            None => kind
                .default_api_key_env()
                .and_then(|env| std::env::var(env).ok()),
        };
        if kind == ProviderKind::Anthropic && api_key.is_none() {
            return Err(ProviderError::MissingApiKey {
                backend: name,
                env: kind.default_api_key_env().unwrap_or_default().to_string(),
            });
        }

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(kind.default_base_url())
            .trim_end_matches('/')
            .to_string();
        let max_tokens = config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
        let client = self.client(&name)?;

        info!(
            backend = name.as_str(),
            provider = kind.as_str(),
            model = model.as_str(),
            "Configured backend"
        );

        let backend: Arc<dyn Backend> = match kind {
            ProviderKind::OpenAi => Arc::new(OpenAiBackend::new(
                client, base_url, model, api_key, max_tokens,
            )),
            ProviderKind::Anthropic => Arc::new(AnthropicBackend::new(
                client,
                base_url,
                model,
                api_key.unwrap_or_default(),
                max_tokens,
            )),
            ProviderKind::Echo => Arc::new(EchoBackend::new(name)),
        };
        Ok(backend)
    }

    fn client(&self, backend: &str) -> Result<reqwest::Client, ProviderError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = self.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build().map_err(|e| ProviderError::Client {
            backend: backend.to_string(),
            message: e.to_string(),
        })
    }

    /// Build every configured backend into a registry
    pub fn build_registry(
        &self,
        configs: &[FileBackendConfig],
    ) -> Result<BackendRegistry, ProviderError> {
        let mut registry = BackendRegistry::new();
        for config in configs {
            let name = BackendName::parse(&config.name)?;
            registry.insert(name, self.build(config)?);
        }
        Ok(registry)
    }
}

/// Map a reqwest failure onto the backend error categories
pub(crate) fn transport_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else {
        BackendError::Transport(e.to_string())
    }
}

/// Turn a non-success HTTP status into a transport error carrying the body
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(BackendError::Transport(format!(
        "HTTP {}: {}",
        status.as_u16(),
        council_domain::truncate(&body, 200)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider_kind() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!("echo".parse::<ProviderKind>().unwrap(), ProviderKind::Echo);
        assert!("bedrock".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_build_echo_registry() {
        let configs = vec![FileBackendConfig::echo("a"), FileBackendConfig::echo("b")];
        let registry = BackendFactory::new(None).build_registry(&configs).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.contains(&BackendName::parse("b").unwrap()));
    }

    #[test]
    fn test_missing_model_is_rejected() {
        let config = FileBackendConfig {
            name: "gpt".to_string(),
            provider: "openai".to_string(),
            ..FileBackendConfig::default()
        };
        let err = BackendFactory::new(None).build(&config).err().unwrap();
        assert!(matches!(err, ProviderError::MissingModel { .. }));
    }

    #[test]
    fn test_missing_api_key_env_is_rejected() {
        let config = FileBackendConfig {
            name: "claude".to_string(),
            provider: "anthropic".to_string(),
            model: Some("claude-3-5-haiku-latest".to_string()),
            api_key_env: Some("LLM_COUNCIL_TEST_UNSET_KEY_7F3A".to_string()),
            ..FileBackendConfig::default()
        };
        let err = BackendFactory::new(None).build(&config).err().unwrap();
        assert!(
            matches!(err, ProviderError::MissingApiKey { ref env, .. } if env == "LLM_COUNCIL_TEST_UNSET_KEY_7F3A")
        );
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let config = FileBackendConfig {
            name: "x".to_string(),
            provider: "bedrock".to_string(),
            ..FileBackendConfig::default()
        };
        let err = BackendFactory::new(None).build(&config).err().unwrap();
        assert!(matches!(err, ProviderError::UnknownProvider { .. }));
    }
}
