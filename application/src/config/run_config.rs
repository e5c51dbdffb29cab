//! Run configuration: per-call limits and strategy knobs.
//!
//! [`RunConfig`] is the single configuration value threaded through every
//! strategy in a run. It is serialized verbatim into the run's
//! `config_snapshot` so a checkpoint records exactly what produced it.

use medqa_domain::{GraphOptions, StrategyKind, TemperatureSchedule, ThoughtGraph};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Benchmark run parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Model identifier passed to the backend.
    pub model: String,
    /// Base sampling temperature for single-call and debate stages.
    pub temperature: f32,
    /// Output token cap for ordinary stages.
    pub max_output_tokens: u32,
    /// Per-call timeout in seconds.
    pub timeout_seconds: u64,
    /// Explicit question-level budget. Derived from the call count when unset.
    pub question_timeout_seconds: Option<u64>,
    /// Number of specialists consulted by the planner strategy.
    pub top_k: usize,
    /// Independent agents polled by the majority-vote strategy.
    pub voting_agents: usize,
    /// Strengthened retries per stage when output cannot be parsed.
    pub max_retries: usize,
    /// Save a checkpoint every this many completed questions.
    pub checkpoint_interval: usize,
    /// Debate rounds (opening round included).
    pub debate_rounds: usize,
    /// Independent high-temperature branches for the parallel strategy.
    pub parallel_branches: usize,
    /// Temperature of the exploration stages.
    pub exploration_temperature: f32,
    /// Temperatures for the progressive strategy, one stage each.
    pub progressive_schedule: TemperatureSchedule,
    /// Issue independent calls of a layer concurrently.
    pub concurrent_stages: bool,
    /// Ablation switches for the graph strategy.
    pub graph: GraphOptions,
    /// Per-agent overrides; unset ones fall back to `temperature`.
    pub planner_temperature: Option<f32>,
    pub specialist_temperature: Option<f32>,
    pub aggregator_temperature: Option<f32>,
    pub planner_max_tokens: u32,
    pub aggregator_max_tokens: u32,
    pub decision_max_tokens: u32,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            model: "llama3.1:8b".to_string(),
            temperature: 0.3,
            max_output_tokens: 800,
            timeout_seconds: 30,
            question_timeout_seconds: None,
            top_k: 5,
            voting_agents: 3,
            max_retries: 1,
            checkpoint_interval: 10,
            debate_rounds: 3,
            parallel_branches: 5,
            exploration_temperature: 1.0,
            progressive_schedule: TemperatureSchedule::default(),
            concurrent_stages: false,
            graph: GraphOptions::default(),
            planner_temperature: None,
            specialist_temperature: None,
            aggregator_temperature: None,
            planner_max_tokens: 3500,
            aggregator_max_tokens: 2000,
            decision_max_tokens: 512,
        }
    }
}

impl RunConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Number of gateway calls a strategy makes on the happy path.
    pub fn nominal_call_count(&self, kind: StrategyKind) -> usize {
        match kind {
            StrategyKind::ZeroShot | StrategyKind::ZeroShotPhysician | StrategyKind::ChainOfThought => 1,
            StrategyKind::Debate | StrategyKind::PhysicianDebate => {
                2 + 2 * self.debate_rounds.saturating_sub(1) + 1
            }
            StrategyKind::PlannerSpecialists => 1 + self.top_k + 1,
            // selection, agents, synthesis on a split vote
            StrategyKind::MajorityVote => 1 + self.voting_agents + 1,
            StrategyKind::ProgressiveTemperature => self.progressive_schedule.len(),
            StrategyKind::ProgressiveTemperatureParallel => self.parallel_branches + 2,
            StrategyKind::GraphOfThoughts => ThoughtGraph::plan(self.graph).nodes.len(),
        }
    }

    /// Wall-clock budget for one question.
    ///
    /// Defaults to twice the per-call timeout for every nominal call, which
    /// leaves room for one retry of each.
    pub fn question_budget(&self, kind: StrategyKind) -> Duration {
        match self.question_timeout_seconds {
            Some(secs) => Duration::from_secs(secs),
            None => {
                let calls = self.nominal_call_count(kind).max(1) as u64;
                Duration::from_secs(self.timeout_seconds.saturating_mul(2).saturating_mul(calls))
            }
        }
    }

    pub fn planner_temperature(&self) -> f32 {
        self.planner_temperature.unwrap_or(self.temperature)
    }

    pub fn specialist_temperature(&self) -> f32 {
        self.specialist_temperature.unwrap_or(self.temperature)
    }

    pub fn aggregator_temperature(&self) -> f32 {
        self.aggregator_temperature.unwrap_or(self.temperature)
    }

    /// Check numeric ranges. Returns one message per problem.
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let temps = [
            ("temperature", Some(self.temperature)),
            ("exploration_temperature", Some(self.exploration_temperature)),
            ("planner_temperature", self.planner_temperature),
            ("specialist_temperature", self.specialist_temperature),
            ("aggregator_temperature", self.aggregator_temperature),
        ];
        for (name, value) in temps {
            if let Some(t) = value
                && !(0.0..=1.0).contains(&t)
            {
                problems.push(format!("{name} must be within [0, 1], got {t}"));
            }
        }
        if self.timeout_seconds == 0 {
            problems.push("timeout_seconds must be positive".to_string());
        }
        if self.question_timeout_seconds == Some(0) {
            problems.push("question_timeout_seconds must be positive".to_string());
        }
        if self.top_k == 0 {
            problems.push("top_k must be at least 1".to_string());
        }
        if self.voting_agents == 0 {
            problems.push("voting_agents must be at least 1".to_string());
        }
        if self.debate_rounds == 0 {
            problems.push("debate_rounds must be at least 1".to_string());
        }
        if self.parallel_branches == 0 {
            problems.push("parallel_branches must be at least 1".to_string());
        }
        if self.checkpoint_interval == 0 {
            problems.push("checkpoint_interval must be at least 1".to_string());
        }
        if self.max_output_tokens == 0 {
            problems.push("max_output_tokens must be positive".to_string());
        }
        problems
    }

    // ==================== Builder Methods ====================

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_output_tokens(mut self, max: u32) -> Self {
        self.max_output_tokens = max;
        self
    }

    pub fn with_timeout_seconds(mut self, secs: u64) -> Self {
        self.timeout_seconds = secs;
        self
    }

    pub fn with_question_timeout_seconds(mut self, secs: Option<u64>) -> Self {
        self.question_timeout_seconds = secs;
        self
    }

    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k;
        self
    }

    pub fn with_voting_agents(mut self, agents: usize) -> Self {
        self.voting_agents = agents;
        self
    }

    pub fn with_max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn with_checkpoint_interval(mut self, interval: usize) -> Self {
        self.checkpoint_interval = interval;
        self
    }

    pub fn with_debate_rounds(mut self, rounds: usize) -> Self {
        self.debate_rounds = rounds;
        self
    }

    pub fn with_parallel_branches(mut self, branches: usize) -> Self {
        self.parallel_branches = branches;
        self
    }

    pub fn with_exploration_temperature(mut self, temperature: f32) -> Self {
        self.exploration_temperature = temperature;
        self
    }

    pub fn with_progressive_schedule(mut self, schedule: TemperatureSchedule) -> Self {
        self.progressive_schedule = schedule;
        self
    }

    pub fn with_concurrent_stages(mut self, enabled: bool) -> Self {
        self.concurrent_stages = enabled;
        self
    }

    pub fn with_graph_options(mut self, options: GraphOptions) -> Self {
        self.graph = options;
        self
    }

    pub fn with_planner_temperature(mut self, temperature: Option<f32>) -> Self {
        self.planner_temperature = temperature;
        self
    }

    pub fn with_specialist_temperature(mut self, temperature: Option<f32>) -> Self {
        self.specialist_temperature = temperature;
        self
    }

    pub fn with_aggregator_temperature(mut self, temperature: Option<f32>) -> Self {
        self.aggregator_temperature = temperature;
        self
    }

    /// Output caps for the planner, aggregation and decision stages.
    pub fn with_token_limits(mut self, planner: u32, aggregator: u32, decision: u32) -> Self {
        self.planner_max_tokens = planner;
        self.aggregator_max_tokens = aggregator;
        self.decision_max_tokens = decision;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = RunConfig::default();
        assert_eq!(config.timeout_seconds, 30);
        assert_eq!(config.top_k, 5);
        assert_eq!(config.max_retries, 1);
        assert!(!config.concurrent_stages);
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_nominal_call_counts() {
        let config = RunConfig::default();
        assert_eq!(config.nominal_call_count(StrategyKind::ZeroShot), 1);
        assert_eq!(config.nominal_call_count(StrategyKind::Debate), 7);
        assert_eq!(config.nominal_call_count(StrategyKind::PlannerSpecialists), 7);
        assert_eq!(config.nominal_call_count(StrategyKind::MajorityVote), 5);
        assert_eq!(config.nominal_call_count(StrategyKind::ProgressiveTemperature), 5);
        assert_eq!(config.nominal_call_count(StrategyKind::ProgressiveTemperatureParallel), 7);
        assert_eq!(config.nominal_call_count(StrategyKind::GraphOfThoughts), 15);

        let single_round = config.with_debate_rounds(1);
        assert_eq!(single_round.nominal_call_count(StrategyKind::PhysicianDebate), 3);
    }

    #[test]
    fn test_question_budget() {
        let config = RunConfig::default().with_timeout_seconds(10);
        assert_eq!(config.question_budget(StrategyKind::ZeroShot), Duration::from_secs(20));
        assert_eq!(config.question_budget(StrategyKind::Debate), Duration::from_secs(140));

        let fixed = config.with_question_timeout_seconds(Some(45));
        assert_eq!(fixed.question_budget(StrategyKind::Debate), Duration::from_secs(45));
    }

    #[test]
    fn test_temperature_overrides() {
        let config = RunConfig::default().with_temperature(0.4);
        assert_eq!(config.planner_temperature(), 0.4);
        assert_eq!(config.specialist_temperature(), 0.4);
        assert_eq!(config.aggregator_temperature(), 0.4);

        let config = config
            .with_planner_temperature(Some(0.2))
            .with_aggregator_temperature(Some(0.1));
        assert_eq!(config.planner_temperature(), 0.2);
        assert_eq!(config.aggregator_temperature(), 0.1);
    }

    #[test]
    fn test_validate_reports_each_problem() {
        let config = RunConfig::default()
            .with_temperature(1.5)
            .with_top_k(0)
            .with_timeout_seconds(0);
        let problems = config.validate();
        assert_eq!(problems.len(), 3);
        assert!(problems.iter().any(|p| p.starts_with("temperature")));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: RunConfig = serde_json::from_str(r#"{"top_k": 3, "debate_rounds": 2}"#).unwrap();
        assert_eq!(config.top_k, 3);
        assert_eq!(config.debate_rounds, 2);
        assert_eq!(config.timeout_seconds, 30);
    }
}
