//! CLI entrypoint for LLM Council
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use council_application::{
    AskCouncilInput, ConcurrencyGovernor, CouncilService, ProgressNotifier,
};
use council_domain::{ConfigIssue, FailurePolicy, OutputFormat};
use council_infrastructure::{BackendFactory, ConfigLoader, FileConfig};
use council_presentation::{
    Cli, ConsoleFormatter, CouncilServer, ProgressReporter, SimpleProgress,
};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Logs go to stderr, and also to `log_file` when given.
/// The returned guard must live until exit so buffered lines are flushed.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
            let file_name = path
                .file_name()
                .with_context(|| format!("invalid log file path: {}", path.display()))?;
            let appender = tracing_appender::rolling::never(dir.unwrap_or(Path::new(".")), file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}

fn report_issues(issues: &[ConfigIssue]) -> Result<()> {
    for issue in issues {
        if issue.is_error() {
            eprintln!("config error: {}", issue);
        } else {
            warn!("{}", issue);
        }
    }
    if issues.iter().any(ConfigIssue::is_error) {
        bail!("invalid configuration");
    }
    Ok(())
}

fn read_question() -> Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        print!("> ");
        io::stdout().flush()?;
    }
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn build_service(config: &FileConfig, strict: bool) -> Result<CouncilService> {
    // Conversion issues are already part of FileConfig::validate
    let (mut params, _) = config.council.to_execution_params();
    let (governor_config, _) = config.limits.to_governor_config();

    if strict {
        params = params.with_failure_policy(FailurePolicy::Strict);
    }

    let builder = config.graph_builder()?;
    let registry = BackendFactory::new(params.backend_timeout).build_registry(&config.backends)?;
    let governor = Arc::new(ConcurrencyGovernor::new(governor_config));

    Ok(CouncilService::new(builder, registry, governor, params)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    info!("Starting LLM Council");

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };
    if config.needs_fallback() {
        warn!("No backends configured; using the offline echo council (gpt, claude, gemini)");
    }
    let config = config.with_fallback_backends();
    report_issues(&config.validate())?;

    colored::control::set_override(config.output.color && io::stdout().is_terminal());

    // === Dependency Injection ===
    let mut service = build_service(&config, cli.strict)?;

    if cli.serve {
        let bind = cli.bind.clone().unwrap_or_else(|| config.server.bind.clone());
        let server = CouncilServer::bind(&bind, Arc::new(service))
            .with_context(|| format!("failed to bind {}", bind))?;
        eprintln!("LLM Council listening on http://{}", server.addr());
        let runtime = tokio::runtime::Handle::current();
        tokio::task::spawn_blocking(move || server.run(runtime)).await?;
        return Ok(());
    }

    let question = match cli.question.clone() {
        Some(q) => q,
        None => read_question()?,
    };
    if question.is_empty() {
        bail!("Question is required. Pass it as an argument or on stdin.");
    }

    let format: OutputFormat = cli
        .output
        .map(Into::into)
        .or(config.output.format)
        .unwrap_or_default();

    if !cli.quiet {
        let progress: Arc<dyn ProgressNotifier> = if io::stderr().is_terminal() {
            Arc::new(ProgressReporter::new())
        } else {
            Arc::new(SimpleProgress)
        };
        service = service.with_progress(progress);

        eprintln!();
        eprintln!("Question: {}", question);
        eprintln!(
            "Council: {} (chairman: {})",
            service
                .members()
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            service.chairman()
        );
        eprintln!();
    }

    let mut input = AskCouncilInput::new(question, cli.caller.clone());
    if cli.wants_detail() || format == OutputFormat::Full {
        input = input.detailed();
    }

    match service.ask(input).await {
        Ok(response) => {
            println!("{}", ConsoleFormatter::render(&response, format));
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", ConsoleFormatter::format_error(&e, format));
            bail!("council request failed ({})", e.kind())
        }
    }
}
