//! Strategy kinds

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of reasoning architectures.
///
/// The string form (see [`StrategyKind::as_str`]) is the registry name used
/// on the command line and recorded in checkpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// One call: question and options.
    ZeroShot,
    /// One call with an "experienced physician" role line.
    ZeroShotPhysician,
    /// One call with a structured step-by-step scaffold.
    #[serde(rename = "single_shot_cot")]
    ChainOfThought,
    /// Two agents, fixed rounds, judge.
    Debate,
    /// Debate between two attending-physician personas.
    #[serde(rename = "debate_physician_role")]
    PhysicianDebate,
    /// Triage planner → top-K specialists → aggregator.
    PlannerSpecialists,
    /// Independent specialists vote; synthesis only when no majority.
    MajorityVote,
    /// Linear chain with a descending temperature schedule.
    ProgressiveTemperature,
    /// N independent explorations, zero-temperature merge and decision.
    ProgressiveTemperatureParallel,
    /// Typed-node DAG ending in deterministic aggregation and decision.
    GraphOfThoughts,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 10] = [
        Self::ZeroShot,
        Self::ZeroShotPhysician,
        Self::ChainOfThought,
        Self::Debate,
        Self::PhysicianDebate,
        Self::PlannerSpecialists,
        Self::MajorityVote,
        Self::ProgressiveTemperature,
        Self::ProgressiveTemperatureParallel,
        Self::GraphOfThoughts,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ZeroShot => "zero_shot",
            Self::ZeroShotPhysician => "zero_shot_physician",
            Self::ChainOfThought => "single_shot_cot",
            Self::Debate => "debate",
            Self::PhysicianDebate => "debate_physician_role",
            Self::PlannerSpecialists => "planner_specialists",
            Self::MajorityVote => "majority_vote",
            Self::ProgressiveTemperature => "progressive_temperature",
            Self::ProgressiveTemperatureParallel => "progressive_temperature_parallel",
            Self::GraphOfThoughts => "graph_of_thoughts",
        }
    }

    /// Get a short description for display
    pub fn description(&self) -> &'static str {
        match self {
            Self::ZeroShot => "Single call, question and options only",
            Self::ZeroShotPhysician => "Single call with a physician role line",
            Self::ChainOfThought => "Single call with structured step-by-step reasoning",
            Self::Debate => "Two clinical agents debate for R rounds, then a judge decides",
            Self::PhysicianDebate => "Debate between two attending-physician personas",
            Self::PlannerSpecialists => "Planner scores the catalog, K specialists consult, aggregator decides",
            Self::MajorityVote => "Independent specialists answer, majority vote or synthesis on a split",
            Self::ProgressiveTemperature => "Descending-temperature chain ending at 0.0",
            Self::ProgressiveTemperatureParallel => {
                "N parallel explorations, zero-temperature merge and decision"
            }
            Self::GraphOfThoughts => "Typed reasoning graph with cross-pollinated refinement",
        }
    }

    pub fn is_debate(&self) -> bool {
        matches!(self, Self::Debate | Self::PhysicianDebate)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == normalized)
            .or(match normalized.as_str() {
                "cot" | "chain_of_thought" => Some(Self::ChainOfThought),
                "physician_debate" => Some(Self::PhysicianDebate),
                "planner" => Some(Self::PlannerSpecialists),
                "majority" | "independent_majority" => Some(Self::MajorityVote),
                "got" => Some(Self::GraphOfThoughts),
                _ => None,
            })
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|k| k.as_str()).collect();
                format!("Unknown strategy '{}'. Expected one of: {}", s, names.join(", "))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_roundtrip() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.as_str().parse::<StrategyKind>().unwrap(), kind);
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
    }

    #[test]
    fn test_aliases() {
        assert_eq!("cot".parse::<StrategyKind>().unwrap(), StrategyKind::ChainOfThought);
        assert_eq!(
            "progressive-temperature-parallel".parse::<StrategyKind>().unwrap(),
            StrategyKind::ProgressiveTemperatureParallel
        );
        assert_eq!("majority".parse::<StrategyKind>().unwrap(), StrategyKind::MajorityVote);
    }

    #[test]
    fn test_unknown_lists_choices() {
        let err = "tree_of_thoughts".parse::<StrategyKind>().unwrap_err();
        assert!(err.contains("graph_of_thoughts"));
    }
}
