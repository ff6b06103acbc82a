//! Output formatter trait

use council_application::CouncilResponse;
use council_domain::DetailedCouncilAnswer;

/// Trait for formatting council results
pub trait OutputFormatter {
    /// Every task's output grouped by stage
    fn format_full(&self, answer: &DetailedCouncilAnswer) -> String;

    /// Format as JSON
    fn format_json(&self, response: &CouncilResponse) -> String;

    /// Question and final answer only
    fn format_synthesis_only(&self, response: &CouncilResponse) -> String;
}
