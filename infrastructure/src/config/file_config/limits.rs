//! Admission limits from TOML (`[limits]` section)

use council_application::{AdmissionMode, GovernorConfig, RateLimits};
use council_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw limits configuration
///
/// # Example
///
/// ```toml
/// [limits]
/// max_concurrent = 5
/// admission = "reject"          # or "block"
/// admission_wait_secs = 30
/// simple_per_window = 10
/// detailed_per_window = 5
/// window_secs = 3600
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLimitsConfig {
    pub max_concurrent: usize,
    pub admission: String,
    pub admission_wait_secs: u64,
    pub simple_per_window: u32,
    pub detailed_per_window: u32,
    pub window_secs: u64,
}

impl Default for FileLimitsConfig {
    fn default() -> Self {
        let governor = GovernorConfig::default();
        Self {
            max_concurrent: governor.max_concurrent,
            admission: governor.mode.as_str().to_string(),
            admission_wait_secs: governor.admission_wait.as_secs(),
            simple_per_window: governor.rate_limits.simple,
            detailed_per_window: governor.rate_limits.detailed,
            window_secs: governor.rate_limits.window.as_secs(),
        }
    }
}

impl FileLimitsConfig {
    fn zero(field: &str) -> ConfigIssue {
        ConfigIssue::error(
            ConfigIssueCode::ZeroLimit {
                field: format!("limits.{}", field),
            },
            format!("limits.{} must be greater than zero", field),
        )
    }

    pub fn to_governor_config(&self) -> (GovernorConfig, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let mode = match self.admission.parse::<AdmissionMode>() {
            Ok(mode) => mode,
            Err(_) => {
                issues.push(ConfigIssue::error(
                    ConfigIssueCode::InvalidEnumValue {
                        field: "limits.admission".to_string(),
                        value: self.admission.clone(),
                        valid_values: vec!["reject".to_string(), "block".to_string()],
                    },
                    format!("limits.admission: unknown value '{}'", self.admission),
                ));
                AdmissionMode::default()
            }
        };

        if self.max_concurrent == 0 {
            issues.push(Self::zero("max_concurrent"));
        }
        if self.window_secs == 0 {
            issues.push(Self::zero("window_secs"));
        }
        if self.simple_per_window == 0 {
            issues.push(Self::zero("simple_per_window"));
        }
        if self.detailed_per_window == 0 {
            issues.push(Self::zero("detailed_per_window"));
        }

        let config = GovernorConfig::default()
            .with_max_concurrent(self.max_concurrent)
            .with_mode(mode)
            .with_admission_wait(Duration::from_secs(self.admission_wait_secs))
            .with_rate_limits(RateLimits {
                simple: self.simple_per_window,
                detailed: self.detailed_per_window,
                window: Duration::from_secs(self.window_secs),
            });
        (config, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_governor_config() {
        let (config, issues) = FileLimitsConfig::default().to_governor_config();
        assert!(issues.is_empty());
        assert_eq!(config, GovernorConfig::default());
    }

    #[test]
    fn test_block_mode_with_custom_window() {
        let limits: FileLimitsConfig = toml::from_str(
            r#"
max_concurrent = 2
admission = "block"
admission_wait_secs = 5
window_secs = 60
"#,
        )
        .unwrap();

        let (config, issues) = limits.to_governor_config();
        assert!(issues.is_empty());
        assert_eq!(config.max_concurrent, 2);
        assert_eq!(config.mode, AdmissionMode::Block);
        assert_eq!(config.admission_wait, Duration::from_secs(5));
        assert_eq!(config.rate_limits.window, Duration::from_secs(60));
        assert_eq!(config.rate_limits.simple, 10);
    }

    #[test]
    fn test_zero_limits_are_errors() {
        let limits = FileLimitsConfig {
            max_concurrent: 0,
            detailed_per_window: 0,
            admission: "queue".to_string(),
            ..FileLimitsConfig::default()
        };
        let (_, issues) = limits.to_governor_config();
        assert_eq!(issues.len(), 3);
        assert!(issues.iter().all(ConfigIssue::is_error));
    }
}
