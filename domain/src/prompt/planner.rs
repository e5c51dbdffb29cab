//! Prompt templates for the planner → specialists → aggregator pipeline

use super::template::format_options;
use crate::catalog::{SpecialtyCatalog, SpecialtyEntry};
use crate::consult::{MAX_DIFFERENTIAL, SpecialistReport};
use crate::core::question::QuestionRecord;

/// Templates for triage, specialist consultation and aggregation
pub struct PlannerPromptTemplate;

impl PlannerPromptTemplate {
    /// Catalog listing, one `- \`id\`: Name (type)` line per entry.
    pub fn catalog_listing(catalog: &SpecialtyCatalog) -> String {
        catalog
            .entries()
            .iter()
            .map(|e| {
                format!(
                    "- `{}`: {} ({})",
                    e.specialty_id,
                    e.display_name,
                    e.specialty_type.as_str()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Triage, score the whole catalog and select the top `top_k`.
    pub fn triage(question: &QuestionRecord, catalog: &SpecialtyCatalog, top_k: usize) -> String {
        let signals = catalog.signals();
        format!(
            r#"You are a senior triage physician planning a multi-specialist consultation.

**Case:**
{question}

**Options:**
{options}

**Specialty catalog (the ONLY valid ids):**
{catalog}

**Your Task:**
1. Pick the triage generalist best suited to own this case.
2. Score EVERY catalog specialty for relevance to this case (0.0-1.0). Weigh emergency red flags ({red_flags}) and pediatric signals ({pediatric}).
3. Select the {top_k} most useful specialties to consult. Prefer complementary perspectives over redundant ones.

Use specialty ids exactly as listed. Respond with JSON only:
{{
  "triage_generalist": "<catalog id>",
  "scored_catalog": [
    {{"specialty_id": "<catalog id>", "relevance": 0.0, "reason": "<short reason>"}}
  ],
  "selected_specialties": ["<catalog id>", "..."],
  "rationale": "<why these specialties>"
}}"#,
            question = question.question_text,
            options = format_options(question),
            catalog = Self::catalog_listing(catalog),
            red_flags = signals.emergency_red_flags.join(", "),
            pediatric = signals.pediatric_signals.join(", "),
            top_k = top_k,
        )
    }

    /// Consultation prompt for one specialist.
    pub fn specialist(question: &QuestionRecord, specialty: &SpecialtyEntry, rationale: &str) -> String {
        format!(
            r#"You are a consultant in {name} (`{id}`), asked for your specialty's view of this case.

**Case:**
{question}

**Options:**
{options}

**Why you were consulted:** {rationale}

**Your Task:**
Give up to {max} differential diagnoses from the perspective of {name}, each with a probability, the findings for and against it, and the findings that would discriminate it from the alternatives.

Respond with JSON only:
{{
  "specialty_id": "{id}",
  "differential": [
    {{"dx": "<diagnosis>", "p": 0.0, "evidence_for": ["..."], "evidence_against": ["..."], "discriminators": ["..."]}}
  ],
  "notes": "<anything the team must not miss>"
}}"#,
            name = specialty.display_name,
            id = specialty.specialty_id,
            question = question.question_text,
            options = format_options(question),
            rationale = if rationale.is_empty() { "not stated" } else { rationale },
            max = MAX_DIFFERENTIAL,
        )
    }

    /// Render specialist reports for the aggregator.
    pub fn format_reports(reports: &[SpecialistReport]) -> String {
        let mut lines = Vec::new();
        for (i, report) in reports.iter().enumerate() {
            lines.push(format!("### Specialist {}: {}", i + 1, report.specialty_id));
            lines.push("**Differential:**".to_string());
            for item in &report.differential {
                lines.push(format!("  - {} (p={:.2})", item.dx, item.p));
                lines.push(format!("    - Evidence for: {}", item.evidence_for.join(", ")));
                lines.push(format!("    - Evidence against: {}", item.evidence_against.join(", ")));
                lines.push(format!("    - Discriminators: {}", item.discriminators.join(", ")));
            }
            if !report.notes.is_empty() {
                lines.push(format!("**Notes:** {}", report.notes));
            }
            lines.push(String::new());
        }
        lines.join("\n").trim_end().to_string()
    }

    /// Merge specialist reports into one answer.
    pub fn aggregator(question: &QuestionRecord, reports: &[SpecialistReport]) -> String {
        format!(
            r#"You are the attending physician integrating specialist consultations into one decision.

**Case:**
{question}

**Options:**
{options}

**Specialist reports:**
{reports}

**Your Task:**
Weigh the specialists' differentials against each other and the case findings, then choose the single best option.

Respond with JSON only:
{{
  "final_answer": "<A, B, C, or D>",
  "ordered_differential": ["<most likely>", "..."],
  "justification": "<how the evidence decides it>",
  "warnings": ["<safety concerns, if any>"]
}}"#,
            question = question.question_text,
            options = format_options(question),
            reports = Self::format_reports(reports),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consult::DifferentialItem;
    use crate::prompt::template::tests::sample_question;

    #[test]
    fn test_triage_lists_every_catalog_id() {
        let catalog = SpecialtyCatalog::standard();
        let prompt = PlannerPromptTemplate::triage(&sample_question(), &catalog, 5);
        for id in catalog.ids() {
            assert!(prompt.contains(&format!("`{}`", id)), "missing {}", id);
        }
        assert!(prompt.contains("- `thoracic_surgery`: Thoracic Surgery (surgical)"));
        assert!(prompt.contains("Select the 5 most useful"));
        assert!(prompt.contains("syncope"));
    }

    #[test]
    fn test_specialist_prompt_names_specialty() {
        let catalog = SpecialtyCatalog::standard();
        let entry = catalog.get("neurology").unwrap();
        let prompt = PlannerPromptTemplate::specialist(&sample_question(), entry, "");
        assert!(prompt.contains("consultant in Neurology (`neurology`)"));
        assert!(prompt.contains("not stated"));
        assert!(prompt.contains(r#""specialty_id": "neurology""#));
    }

    #[test]
    fn test_aggregator_includes_reports() {
        let reports = vec![SpecialistReport {
            specialty_id: "infectious_disease".to_string(),
            differential: vec![DifferentialItem {
                dx: "Bacterial meningitis".to_string(),
                p: 0.8,
                evidence_for: vec!["fever".to_string(), "neck stiffness".to_string()],
                evidence_against: vec![],
                discriminators: vec!["CSF analysis".to_string()],
            }],
            notes: "start empiric antibiotics".to_string(),
        }];
        let prompt = PlannerPromptTemplate::aggregator(&sample_question(), &reports);
        assert!(prompt.contains("### Specialist 1: infectious_disease"));
        assert!(prompt.contains("Bacterial meningitis (p=0.80)"));
        assert!(prompt.contains("Evidence for: fever, neck stiffness"));
        assert!(prompt.contains("**Notes:** start empiric antibiotics"));
    }
}
