//! Structured outputs of the planner → specialists → aggregator pipeline.
//!
//! Each `parse` function is tolerant of fences, comments and surrounding
//! prose, but strict about the fields it needs.

use crate::catalog::ScoredSpecialty;
use crate::core::error::AnswerParseError;
use crate::core::question::AnswerLetter;
use crate::parsing::answer::normalize_token;
use crate::parsing::json::{extract_json_value, parse_string_list};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Specialists report at most this many differential entries.
pub const MAX_DIFFERENTIAL: usize = 3;

/// Triage and catalog scoring produced by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerOutput {
    pub triage_generalist: Option<String>,
    pub scored_catalog: Vec<ScoredSpecialty>,
    pub selected_specialties: Vec<String>,
    pub rationale: String,
}

impl PlannerOutput {
    /// Parse planner output. The selection may be named
    /// `selected_specialties` or `selected`.
    pub fn parse(raw: &str) -> Result<Self, AnswerParseError> {
        let value = extract_json_value(raw)?;
        let selected = ["selected_specialties", "selected"]
            .iter()
            .find_map(|field| value.get(*field).filter(|v| v.is_array()))
            .map(parse_string_list)
            .ok_or_else(|| AnswerParseError::new(raw, "missing selected_specialties list"))?;

        let scored_catalog = value
            .get("scored_catalog")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(scored_entry).collect())
            .unwrap_or_default();

        Ok(Self {
            triage_generalist: value
                .get("triage_generalist")
                .and_then(Value::as_str)
                .map(str::to_string),
            scored_catalog,
            selected_specialties: selected,
            rationale: value
                .get("rationale")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

fn scored_entry(item: &Value) -> Option<ScoredSpecialty> {
    let id = item.get("specialty_id").and_then(Value::as_str)?;
    let relevance = item
        .get("relevance")
        .and_then(Value::as_f64)
        .unwrap_or(0.0)
        .clamp(0.0, 1.0);
    let reason = item
        .get("reason")
        .and_then(Value::as_str)
        .unwrap_or_default();
    Some(ScoredSpecialty::new(id.trim(), relevance, reason))
}

/// One differential diagnosis entry from a specialist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferentialItem {
    pub dx: String,
    #[serde(default)]
    pub p: f64,
    #[serde(default)]
    pub evidence_for: Vec<String>,
    #[serde(default)]
    pub evidence_against: Vec<String>,
    #[serde(default)]
    pub discriminators: Vec<String>,
}

/// A specialist's consultation report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialistReport {
    pub specialty_id: String,
    pub differential: Vec<DifferentialItem>,
    #[serde(default)]
    pub notes: String,
}

impl SpecialistReport {
    /// Parse a report. The id is forced to `specialty_id` (models sometimes
    /// echo a display name) and the differential is capped at
    /// [`MAX_DIFFERENTIAL`] entries.
    pub fn parse(raw: &str, specialty_id: &str) -> Result<Self, AnswerParseError> {
        let value = extract_json_value(raw)?;
        let items = value
            .get("differential")
            .and_then(Value::as_array)
            .ok_or_else(|| AnswerParseError::new(raw, "missing differential list"))?;

        let differential: Vec<DifferentialItem> = items
            .iter()
            .filter_map(|item| serde_json::from_value::<DifferentialItem>(item.clone()).ok())
            .map(|mut item| {
                item.p = item.p.clamp(0.0, 1.0);
                item.evidence_for.retain(|s| !s.trim().is_empty());
                item.evidence_against.retain(|s| !s.trim().is_empty());
                item.discriminators.retain(|s| !s.trim().is_empty());
                item
            })
            .take(MAX_DIFFERENTIAL)
            .collect();

        if differential.is_empty() {
            return Err(AnswerParseError::new(raw, "differential has no usable entries"));
        }

        Ok(Self {
            specialty_id: specialty_id.to_string(),
            differential,
            notes: value
                .get("notes")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }
}

/// The aggregator's final decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorDecision {
    pub final_answer: AnswerLetter,
    pub ordered_differential: Vec<String>,
    pub justification: String,
    pub warnings: Vec<String>,
}

impl AggregatorDecision {
    pub fn parse(raw: &str) -> Result<Self, AnswerParseError> {
        let value = extract_json_value(raw)?;
        let final_answer = value
            .get("final_answer")
            .and_then(Value::as_str)
            .and_then(normalize_token)
            .ok_or_else(|| AnswerParseError::new(raw, "final_answer is not one of A-D"))?;

        Ok(Self {
            final_answer,
            ordered_differential: value
                .get("ordered_differential")
                .map(parse_string_list)
                .unwrap_or_default(),
            justification: value
                .get("justification")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            warnings: value
                .get("warnings")
                .map(parse_string_list)
                .unwrap_or_default(),
        })
    }
}
