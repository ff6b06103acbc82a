//! Output format value object

use serde::{Deserialize, Serialize};

/// How a council answer is rendered for the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Every node's output grouped by stage
    Full,
    /// Only the final synthesis (default)
    #[default]
    Synthesis,
    /// JSON output
    Json,
}
