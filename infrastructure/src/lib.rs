//! Infrastructure layer for llm-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading
//! and the HTTP backend providers.

pub mod config;
pub mod providers;

// Re-export commonly used types
pub use config::{
    ConfigLoader, FileBackendConfig, FileConfig, FileCouncilConfig, FileLimitsConfig,
    FileOutputConfig, FileServerConfig,
};
pub use providers::{
    BackendFactory, ProviderError, ProviderKind, anthropic::AnthropicBackend, echo::EchoBackend,
    openai::OpenAiBackend,
};
