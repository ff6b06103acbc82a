//! Console output formatter for council results

use crate::output::formatter::OutputFormatter;
use colored::Colorize;
use council_application::{CouncilError, CouncilResponse};
use council_domain::{DetailedCouncilAnswer, NodeRole, OutputFormat, TaskOutput};

/// Formats council results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Render a response in the requested format
    pub fn render(response: &CouncilResponse, format: OutputFormat) -> String {
        match (format, response) {
            (OutputFormat::Json, _) => Self::format_json(response),
            (OutputFormat::Full, CouncilResponse::Detailed(detailed)) => {
                Self::format_full(detailed)
            }
            _ => Self::format_synthesis_only(response),
        }
    }

    /// Every task's output grouped by stage
    pub fn format_full(answer: &DetailedCouncilAnswer) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("LLM Council Results"));
        output.push('\n');

        output.push_str(&format!(
            "{} {}\n\n",
            "Question:".cyan().bold(),
            answer.question
        ));

        let stages = [
            (NodeRole::Draft, "Stage 1: Drafts"),
            (NodeRole::Critique, "Stage 2: Critiques"),
        ];
        for (role, title) in stages {
            output.push_str(&Self::section_header(title));
            for task in answer.outputs_with_role(role) {
                output.push_str(&Self::task(task));
            }
        }

        output.push_str(&Self::section_header("Stage 3: Final Synthesis"));
        match &answer.final_answer {
            Some(text) => {
                let chairman = answer
                    .outputs_with_role(NodeRole::Synthesis)
                    .next()
                    .map(|t| t.agent.as_str())
                    .unwrap_or("chairman");
                output.push_str(&format!(
                    "\n{}\n\n{}\n",
                    format!("Chairman: {}", chairman).yellow().bold(),
                    text
                ));
            }
            None => {
                for task in answer.outputs_with_role(NodeRole::Synthesis) {
                    output.push_str(&Self::task(task));
                }
            }
        }

        let failed = answer.failed_outputs().count();
        output.push_str(&format!(
            "\n{} {:.2}s",
            "Time:".dimmed(),
            answer.execution_time_seconds
        ));
        if failed > 0 {
            output.push_str(&format!("  {}", format!("{} task(s) failed", failed).red()));
        }
        output.push('\n');

        output.push_str(&Self::footer());
        output
    }

    fn task(task: &TaskOutput) -> String {
        let title = format!("── {} ──", task.task_name);
        if task.is_success() {
            let title = if task.degraded {
                format!("{} {}", title.yellow().bold(), "(partial input)".dimmed())
            } else {
                title.yellow().bold().to_string()
            };
            format!("\n{}\n{}\n", title, task.output)
        } else {
            format!(
                "\n{}\nError: {}\n",
                title.red().bold(),
                task.error.as_deref().unwrap_or("Unknown")
            )
        }
    }

    /// Format as JSON
    pub fn format_json(response: &CouncilResponse) -> String {
        serde_json::to_string_pretty(response).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format synthesis only (concise output)
    pub fn format_synthesis_only(response: &CouncilResponse) -> String {
        let (question, time) = match response {
            CouncilResponse::Simple(a) => (&a.question, a.execution_time_seconds),
            CouncilResponse::Detailed(d) => (&d.question, d.execution_time_seconds),
        };

        let mut output = String::new();
        output.push_str(&format!(
            "{}\n\n",
            "=== LLM Council Conclusion ===".cyan().bold()
        ));
        output.push_str(&format!("{} {}\n\n", "Q:".bold(), question));
        output.push_str(response.answer().unwrap_or_default());
        output.push('\n');
        output.push_str(&format!("\n{}\n", format!("({:.2}s)", time).dimmed()));
        output
    }

    /// Describe a failed request; detailed failures include every task
    pub fn format_error(error: &CouncilError, format: OutputFormat) -> String {
        if let CouncilError::GraphFailure {
            partial: Some(partial),
            ..
        } = error
        {
            return match format {
                OutputFormat::Json => serde_json::to_string_pretty(partial.as_ref())
                    .unwrap_or_else(|_| "{}".to_string()),
                _ => format!(
                    "{}\n{} {}\n",
                    Self::format_full(partial),
                    "Error:".red().bold(),
                    error
                ),
            };
        }

        let mut output = format!("{} {}", "Error:".red().bold(), error);
        if let Some(wait) = error.retry_after() {
            output.push_str(&format!(" (retry in {}s)", wait.as_secs()));
        }
        output
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_full(&self, answer: &DetailedCouncilAnswer) -> String {
        Self::format_full(answer)
    }

    fn format_json(&self, response: &CouncilResponse) -> String {
        Self::format_json(response)
    }

    fn format_synthesis_only(&self, response: &CouncilResponse) -> String {
        Self::format_synthesis_only(response)
    }
}
