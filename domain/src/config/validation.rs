//! Structured configuration issues.
//!
//! Configuration loaders report every problem they detect as a
//! [`ConfigIssue`] instead of failing on the first one, so the caller can
//! print all of them before refusing to start.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the council cannot be assembled.
    Error,
    /// Non-fatal: the council works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// A backend entry has an empty name.
    EmptyBackendName { index: usize },
    /// Two backend entries share a name.
    DuplicateBackend { name: String },
    /// Fewer than two member backends; cross-critique needs a peer.
    TooFewBackends { count: usize },
    /// No chairman configured.
    MissingChairman,
    /// The chairman does not name a configured backend.
    UnknownChairman { name: String },
    /// A string field holds a value outside its allowed set.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    /// A numeric limit that must be positive is zero.
    ZeroLimit { field: String },
    /// A network provider has no model configured.
    MissingModel { backend: String },
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", level, self.message)
    }
}
