//! Strategy catalog and the pure data structures strategies share.
//!
//! - [`kind::StrategyKind`]: the closed set of reasoning architectures
//! - [`schedule::TemperatureSchedule`]: validated descending temperatures
//! - [`graph::ThoughtGraph`]: arena DAG for graph-of-thoughts
//! - [`vote::VoteTally`]: majority counting over agent answers

pub mod graph;
pub mod kind;
pub mod schedule;
pub mod vote;

pub use graph::{EdgeType, GraphError, GraphOptions, NodeType, ThoughtEdge, ThoughtGraph, ThoughtNode};
pub use kind::StrategyKind;
pub use schedule::{ScheduleError, TemperatureSchedule};
pub use vote::VoteTally;
