//! CLI entrypoint for medqa-bench
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result};
use clap::Parser;
use medqa_application::{
    GatewayClient, NoProgress, ProgressNotifier, RunBenchmarkError, RunBenchmarkInput,
    RunBenchmarkUseCase, StrategyContext,
};
use medqa_domain::{SpecialtyCatalog, StrategyKind};
use medqa_infrastructure::{
    ConfigLoader, FileConfig, JsonCheckpointStore, JsonlRunEventLogger, build_gateway, load_dataset,
};
use medqa_presentation::{Cli, ConsoleFormatter, OutputFormat, ProgressReporter, SimpleProgress};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

const EXIT_FATAL: u8 = 1;
const EXIT_INTERRUPTED: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            eprintln!("error: {:#}", err);
            ExitCode::from(EXIT_FATAL)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    if cli.list_strategies {
        print!("{}", ConsoleFormatter::format_strategies());
        return Ok(ExitCode::SUCCESS);
    }
    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(ExitCode::SUCCESS);
    }

    let (strategy, dataset_path) = cli.run_target().map_err(anyhow::Error::msg)?;

    let mut config = ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")?;
    apply_cli_overrides(&mut config, &cli);
    ConsoleFormatter::set_color(config.output.color && std::io::stdout().is_terminal());

    let run_dir = match &cli.resume {
        Some(dir) => dir.clone(),
        None => new_run_dir(&config.output.dir, strategy),
    };
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("cannot create run directory {}", run_dir.display()))?;

    let _log_guard = init_logging(&cli, &run_dir);
    info!("Starting medqa-bench ({})", strategy);

    // Reject bad settings before any model call.
    ConfigLoader::check(&config)?;

    let dataset = load_dataset(&dataset_path)?;
    let mut questions = dataset.questions;
    if let Some(n) = cli.n {
        questions.truncate(n);
    }

    // === Dependency Injection ===
    let gateway = build_gateway(&config.backend)?;
    let ctx = StrategyContext::new(
        GatewayClient::new(gateway),
        Arc::new(SpecialtyCatalog::standard()),
        Arc::new(config.to_run_config()),
    );

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let mut use_case = RunBenchmarkUseCase::new(ctx, Arc::new(JsonCheckpointStore::new(&run_dir)))
        .with_cancellation(cancel);
    if let Some(logger) = JsonlRunEventLogger::new(run_dir.join("events.jsonl")) {
        use_case = use_case.with_event_logger(Arc::new(logger));
    }

    let mut input = RunBenchmarkInput::new(strategy, questions).with_resume(cli.resume.is_some());
    if cli.no_warmup {
        input = input.without_warm_up();
    }

    let progress: Box<dyn ProgressNotifier> = if cli.quiet {
        Box::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Box::new(ProgressReporter::new())
    } else {
        Box::new(SimpleProgress)
    };

    match use_case.execute_with_progress(input, progress.as_ref()).await {
        Ok(output) => {
            let rendered = match cli.format {
                OutputFormat::Text => ConsoleFormatter::format_summary(&output.summary, Some(&run_dir)),
                OutputFormat::Json => ConsoleFormatter::format_json(&output.summary),
            };
            println!("{}", rendered);
            Ok(ExitCode::SUCCESS)
        }
        Err(RunBenchmarkError::Interrupted { completed }) => {
            eprintln!(
                "Interrupted after {} questions. Resume with: --resume {}",
                completed,
                run_dir.display()
            );
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
        Err(err @ RunBenchmarkError::Backend(_)) => {
            error!("{}", err);
            eprintln!(
                "error: {}\nCheckpoint kept in {}. Resume with: --resume {}",
                err,
                run_dir.display(),
                run_dir.display()
            );
            Ok(ExitCode::from(EXIT_FATAL))
        }
        Err(err) => Err(err.into()),
    }
}

/// CLI flags take precedence over every config source.
fn apply_cli_overrides(config: &mut FileConfig, cli: &Cli) {
    if let Some(model) = &cli.model {
        config.backend.model = model.clone();
    }
    if let Some(provider) = &cli.provider {
        config.backend.provider = provider.clone();
    }
    if let Some(url) = &cli.base_url {
        config.backend.base_url = Some(url.clone());
    }
    if let Some(dir) = &cli.output_dir {
        config.output.dir = dir.clone();
    }
}

fn new_run_dir(parent: &Path, strategy: StrategyKind) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    parent.join(format!("{}-{}", strategy, stamp))
}

/// Stderr logs follow `-v` (or `RUST_LOG`); `run.log` in the run directory
/// always records at least info level.
fn init_logging(cli: &Cli, run_dir: &Path) -> WorkerGuard {
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));
    let file_level = if cli.verbose >= 2 { cli.log_level() } else { "info" };

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(run_dir, "run.log"));

    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(console_filter);
    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_filter(EnvFilter::new(file_level));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    guard
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                warn!("Interrupt received, saving checkpoint");
                cancel.cancel();
            }
            Err(e) => warn!("Cannot listen for Ctrl-C: {}", e),
        }
    });
}
