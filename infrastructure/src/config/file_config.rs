//! Raw TOML configuration data types
//!
//! These structs mirror the sections of `medqa.toml`. Every section is
//! optional and falls back to its defaults.

use super::validation::{ConfigIssue, ConfigIssueCode};
use medqa_application::RunConfig;
use medqa_domain::{GraphOptions, SpecialtyCatalog, TemperatureSchedule};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Inference backends the CLI can talk to.
pub const PROVIDERS: &[&str] = &["ollama", "vllm", "openai"];

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub backend: FileBackendConfig,
    pub run: FileRunConfig,
    pub planner: FilePlannerConfig,
    pub majority: FileMajorityConfig,
    pub debate: FileDebateConfig,
    pub progressive: FileProgressiveConfig,
    pub parallel: FileParallelConfig,
    pub graph: FileGraphConfig,
    pub output: FileOutputConfig,
}

/// `[backend]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBackendConfig {
    /// `ollama`, `vllm` or `openai`
    pub provider: String,
    pub model: String,
    /// Defaults per provider when unset.
    pub base_url: Option<String>,
    /// Use `/v1/chat/completions` rather than `/v1/completions`.
    pub use_chat_api: bool,
    /// Environment variable holding the API key for hosted backends.
    pub api_key_env: String,
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: RunConfig::default().model,
            base_url: None,
            use_chat_api: true,
            api_key_env: "OPENAI_API_KEY".to_string(),
        }
    }
}

/// `[run]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRunConfig {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout_seconds: u64,
    pub question_timeout_seconds: Option<u64>,
    pub max_retries: usize,
    pub checkpoint_interval: usize,
    pub concurrent_stages: bool,
}

impl Default for FileRunConfig {
    fn default() -> Self {
        let run = RunConfig::default();
        Self {
            temperature: run.temperature,
            max_output_tokens: run.max_output_tokens,
            timeout_seconds: run.timeout_seconds,
            question_timeout_seconds: run.question_timeout_seconds,
            max_retries: run.max_retries,
            checkpoint_interval: run.checkpoint_interval,
            concurrent_stages: run.concurrent_stages,
        }
    }
}

/// `[planner]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePlannerConfig {
    pub top_k: usize,
    pub planner_temperature: Option<f32>,
    pub specialist_temperature: Option<f32>,
    pub aggregator_temperature: Option<f32>,
    pub planner_max_tokens: u32,
    pub aggregator_max_tokens: u32,
}

impl Default for FilePlannerConfig {
    fn default() -> Self {
        let run = RunConfig::default();
        Self {
            top_k: run.top_k,
            planner_temperature: None,
            specialist_temperature: None,
            aggregator_temperature: None,
            planner_max_tokens: run.planner_max_tokens,
            aggregator_max_tokens: run.aggregator_max_tokens,
        }
    }
}

/// `[majority]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMajorityConfig {
    pub agents: usize,
}

impl Default for FileMajorityConfig {
    fn default() -> Self {
        Self {
            agents: RunConfig::default().voting_agents,
        }
    }
}

/// `[debate]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDebateConfig {
    pub rounds: usize,
}

impl Default for FileDebateConfig {
    fn default() -> Self {
        Self {
            rounds: RunConfig::default().debate_rounds,
        }
    }
}

/// `[progressive]`
///
/// Kept as a raw list so an invalid schedule is reported by `validate`
/// rather than failing deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileProgressiveConfig {
    pub schedule: Vec<f32>,
}

impl Default for FileProgressiveConfig {
    fn default() -> Self {
        Self {
            schedule: TemperatureSchedule::default().temperatures().to_vec(),
        }
    }
}

/// `[parallel]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileParallelConfig {
    pub branches: usize,
    pub exploration_temperature: f32,
}

impl Default for FileParallelConfig {
    fn default() -> Self {
        let run = RunConfig::default();
        Self {
            branches: run.parallel_branches,
            exploration_temperature: run.exploration_temperature,
        }
    }
}

/// `[graph]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGraphConfig {
    pub refinement: bool,
    pub cross_pollination: bool,
    pub decision_max_tokens: u32,
}

impl Default for FileGraphConfig {
    fn default() -> Self {
        let options = GraphOptions::default();
        Self {
            refinement: options.refinement,
            cross_pollination: options.cross_pollination,
            decision_max_tokens: RunConfig::default().decision_max_tokens,
        }
    }
}

/// `[output]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Parent directory of per-run output directories.
    pub dir: PathBuf,
    /// Enable colored terminal output
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("runs"),
            color: true,
        }
    }
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        if !PROVIDERS.contains(&self.backend.provider.to_lowercase().as_str()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidEnumValue {
                    field: "backend.provider".to_string(),
                    value: self.backend.provider.clone(),
                    valid_values: PROVIDERS.iter().map(|p| p.to_string()).collect(),
                },
                format!("backend.provider: unknown provider '{}'", self.backend.provider),
            ));
        }
        if self.backend.model.trim().is_empty() {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::Empty {
                    field: "backend.model".to_string(),
                },
                "backend.model must not be empty",
            ));
        }

        let temperatures = [
            ("run.temperature", Some(self.run.temperature)),
            ("parallel.exploration_temperature", Some(self.parallel.exploration_temperature)),
            ("planner.planner_temperature", self.planner.planner_temperature),
            ("planner.specialist_temperature", self.planner.specialist_temperature),
            ("planner.aggregator_temperature", self.planner.aggregator_temperature),
        ];
        for (field, value) in temperatures {
            if let Some(t) = value
                && !(0.0..=1.0).contains(&t)
            {
                issues.push(ConfigIssue::out_of_range(
                    field,
                    format!("{field}: {t} is outside [0.0, 1.0]"),
                ));
            }
        }

        if let Err(err) = TemperatureSchedule::new(self.progressive.schedule.clone()) {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidSchedule,
                format!("progressive.schedule: {err}"),
            ));
        }

        let catalog_size = SpecialtyCatalog::standard().len();
        if !(1..=catalog_size).contains(&self.planner.top_k) {
            issues.push(ConfigIssue::out_of_range(
                "planner.top_k",
                format!("planner.top_k must be within 1..={catalog_size}, got {}", self.planner.top_k),
            ));
        }
        if !(1..=catalog_size).contains(&self.majority.agents) {
            issues.push(ConfigIssue::out_of_range(
                "majority.agents",
                format!("majority.agents must be within 1..={catalog_size}, got {}", self.majority.agents),
            ));
        }

        let minimums = [
            ("run.timeout_seconds", self.run.timeout_seconds as usize),
            ("run.checkpoint_interval", self.run.checkpoint_interval),
            ("run.max_output_tokens", self.run.max_output_tokens as usize),
            ("debate.rounds", self.debate.rounds),
            ("parallel.branches", self.parallel.branches),
        ];
        for (field, value) in minimums {
            if value < 1 {
                issues.push(ConfigIssue::out_of_range(field, format!("{field} must be at least 1")));
            }
        }
        if self.run.question_timeout_seconds == Some(0) {
            issues.push(ConfigIssue::out_of_range(
                "run.question_timeout_seconds",
                "run.question_timeout_seconds must be at least 1",
            ));
        }

        if self.run.max_retries > 3 {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "run.max_retries".to_string(),
                },
                format!(
                    "run.max_retries = {} multiplies worst-case calls per stage",
                    self.run.max_retries
                ),
            ));
        }

        issues
    }

    /// Build the run configuration. Call after `validate` reported no errors;
    /// an unusable schedule falls back to the default one.
    pub fn to_run_config(&self) -> RunConfig {
        let schedule = TemperatureSchedule::new(self.progressive.schedule.clone()).unwrap_or_default();
        RunConfig::default()
            .with_model(self.backend.model.clone())
            .with_temperature(self.run.temperature)
            .with_max_output_tokens(self.run.max_output_tokens)
            .with_timeout_seconds(self.run.timeout_seconds)
            .with_question_timeout_seconds(self.run.question_timeout_seconds)
            .with_max_retries(self.run.max_retries)
            .with_checkpoint_interval(self.run.checkpoint_interval)
            .with_concurrent_stages(self.run.concurrent_stages)
            .with_top_k(self.planner.top_k)
            .with_voting_agents(self.majority.agents)
            .with_planner_temperature(self.planner.planner_temperature)
            .with_specialist_temperature(self.planner.specialist_temperature)
            .with_aggregator_temperature(self.planner.aggregator_temperature)
            .with_debate_rounds(self.debate.rounds)
            .with_progressive_schedule(schedule)
            .with_parallel_branches(self.parallel.branches)
            .with_exploration_temperature(self.parallel.exploration_temperature)
            .with_graph_options(GraphOptions {
                refinement: self.graph.refinement,
                cross_pollination: self.graph.cross_pollination,
            })
            .with_token_limits(
                self.planner.planner_max_tokens,
                self.planner.aggregator_max_tokens,
                self.graph.decision_max_tokens,
            )
    }
}
