//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for council results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Every task's output grouped by stage (requests the detailed view)
    Full,
    /// Only the final synthesis
    Synthesis,
    /// JSON output
    Json,
}

impl From<OutputFormat> for council_domain::OutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Full => council_domain::OutputFormat::Full,
            OutputFormat::Synthesis => council_domain::OutputFormat::Synthesis,
            OutputFormat::Json => council_domain::OutputFormat::Json,
        }
    }
}

/// CLI arguments for llm-council
#[derive(Parser, Debug)]
#[command(name = "llm-council")]
#[command(author, version, about = "LLM Council - Several models draft, cross-critique and synthesize one answer")]
#[command(long_about = r#"
LLM Council asks several language models the same question and combines their work.

The process has three stages:
1. Drafts: every member answers the question independently, in parallel
2. Critiques: every member reviews the drafts of the other members
3. Synthesis: the chairman writes the final answer from all critiques

Configuration files are loaded from (in priority order):
1. LLM_COUNCIL_* environment variables
2. --config <path>     Explicit config file
3. ./council.toml      Project-level config
4. ~/.config/llm-council/config.toml   Global config

Example:
  llm-council "What is the capital of Australia?"
  llm-council --detailed -o full "Compare B-trees and LSM-trees"
  llm-council --serve --bind 127.0.0.1:8000
"#)]
pub struct Cli {
    /// The question to ask the council (read from stdin when omitted)
    pub question: Option<String>,

    /// Request every task's output, not just the final answer
    #[arg(short, long)]
    pub detailed: bool,

    /// Output format (defaults to the configured format, then synthesis)
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Identity used for rate limiting
    #[arg(long, value_name = "NAME", default_value = "cli")]
    pub caller: String,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Run the HTTP server instead of answering one question
    #[arg(long)]
    pub serve: bool,

    /// Address for --serve (overrides [server] bind)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Fail a task as soon as any of its inputs fails
    #[arg(long)]
    pub strict: bool,
}

impl Cli {
    /// The full format needs every task's output
    pub fn wants_detail(&self) -> bool {
        self.detailed || self.output == Some(OutputFormat::Full)
    }
}
