//! CLI command definitions

use clap::{Parser, ValueEnum};
use medqa_domain::StrategyKind;
use std::path::PathBuf;

/// Output format for the final run summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable summary table
    #[default]
    Text,
    /// Run summary as JSON on stdout
    Json,
}

/// CLI arguments for medqa-bench
#[derive(Parser, Debug)]
#[command(name = "medqa-bench")]
#[command(author, version, about = "Benchmark multi-call LLM reasoning strategies on MedQA")]
#[command(long_about = r#"
medqa-bench runs one reasoning strategy over a MedQA multiple-choice dataset
against a local or hosted model, checkpointing as it goes.

Every model call is recorded in the run directory:
  checkpoint.json   full per-question results with call traces
  summary.json      accuracy, error, token and latency statistics
  events.jsonl      structured run events
  run.log           diagnostic log

Configuration files are loaded from (in priority order):
1. --config <path>     Explicit config file
2. ./medqa.toml        Project-level config
3. ~/.config/medqa-bench/config.toml   Global config
Environment variables prefixed MEDQA_ (e.g. MEDQA_RUN__TEMPERATURE=0.0)
override files; CLI flags override everything.

Example:
  medqa-bench --strategy zero_shot --dataset data/medqa_test.jsonl --n 50
  medqa-bench --strategy debate --dataset data/medqa_test.jsonl --provider vllm --model meditron-7b
  medqa-bench --strategy debate --dataset data/medqa_test.jsonl --resume runs/debate-20260101-120000
"#)]
pub struct Cli {
    /// Strategy to run (see --list-strategies)
    #[arg(short, long, value_name = "NAME")]
    pub strategy: Option<StrategyKind>,

    /// MedQA dataset (JSON array or JSONL)
    #[arg(short, long, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    /// Only run the first N questions of the dataset
    #[arg(short, long, value_name = "COUNT")]
    pub n: Option<usize>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Resume from the checkpoint in this run directory
    #[arg(long, value_name = "CHECKPOINT_DIR")]
    pub resume: Option<PathBuf>,

    /// Parent directory for new run directories (overrides [output].dir)
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Model identifier passed to the backend
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Inference backend: ollama, vllm or openai
    #[arg(long, value_name = "PROVIDER")]
    pub provider: Option<String>,

    /// Backend base URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Skip the warm-up call before the first question
    #[arg(long)]
    pub no_warmup: bool,

    /// List the available strategies and exit
    #[arg(long)]
    pub list_strategies: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Summary output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,
}

impl Cli {
    /// Strategy and dataset, which every benchmark run needs.
    pub fn run_target(&self) -> Result<(StrategyKind, PathBuf), String> {
        match (self.strategy, &self.dataset) {
            (Some(strategy), Some(dataset)) => Ok((strategy, dataset.clone())),
            (None, _) => Err("--strategy is required (see --list-strategies)".to_string()),
            (_, None) => Err("--dataset is required".to_string()),
        }
    }

    /// Tracing filter directive for the `-v` count.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
