//! Prompt domain
//!
//! Pure slot-filling templates for every stage of every strategy. No state,
//! no I/O; the same inputs always produce the same prompt text.

mod debate;
mod graph;
mod majority;
mod planner;
mod repair;
mod template;

pub use debate::{DebatePersona, DebatePromptTemplate, DebateTurn};
pub use graph::GraphPromptTemplate;
pub use majority::MajorityPromptTemplate;
pub use planner::PlannerPromptTemplate;
pub use repair::RepairHint;
pub use template::{PromptTemplate, format_options};
