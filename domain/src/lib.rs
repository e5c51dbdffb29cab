//! Domain layer for medqa-bench
//!
//! This crate contains the pure logic of the benchmark: question records,
//! answer parsing, the specialty catalog, prompt templates, run records and
//! scoring. It performs no I/O and has no dependency on the application,
//! infrastructure or presentation layers.
//!
//! # Core Concepts
//!
//! ## Strategy
//!
//! One complete multi-call reasoning architecture ([`StrategyKind`]). A
//! strategy is a sequence of **stages**, each normally backed by one model
//! call and recorded as a [`CallTrace`].
//!
//! ## Catalog
//!
//! The fixed [`SpecialtyCatalog`] is the only source of valid specialty ids.
//! Model output that names other ids is rejected and repaired with
//! [`catalog::repair`].
//!
//! ## Scoring
//!
//! [`scoring::score`] keeps failed questions out of the accuracy
//! denominator: a question that errored is never counted as simply wrong.

pub mod catalog;
pub mod consult;
pub mod core;
pub mod parsing;
pub mod prompt;
pub mod run;
pub mod scoring;
pub mod strategy;

// Re-export commonly used types
pub use catalog::{CaseSignals, ScoreSource, ScoredSpecialty, SpecialtyCatalog, SpecialtyEntry, SpecialtyType, repair};
pub use consult::{AggregatorDecision, DifferentialItem, PlannerOutput, SpecialistReport};
pub use core::{
    error::{AnswerParseError, InvalidCatalogValueError, MalformedRecordError},
    question::{AnswerLetter, QuestionRecord},
};
pub use parsing::{extract_json_value, json_string_field, json_string_list, parse_answer, parse_answer_with_fields};
pub use prompt::{
    DebatePersona, DebatePromptTemplate, DebateTurn, GraphPromptTemplate, MajorityPromptTemplate,
    PlannerPromptTemplate, PromptTemplate, RepairHint, format_options,
};
pub use run::{CallTrace, QuestionError, QuestionErrorKind, QuestionResult, RunResult};
pub use scoring::{RunSummary, score};
pub use strategy::{
    EdgeType, GraphOptions, NodeType, StrategyKind, TemperatureSchedule, ThoughtEdge, ThoughtGraph,
    ThoughtNode, VoteTally,
};
