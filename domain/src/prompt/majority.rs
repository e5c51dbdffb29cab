//! Prompt templates for independent specialists with majority voting

use super::template::{ANSWER_FORMAT, format_options};
use crate::catalog::{SpecialtyCatalog, SpecialtyEntry};
use crate::core::question::{AnswerLetter, QuestionRecord};

/// Templates for specialist selection, independent analysis and the
/// synthesis used when the vote is split
pub struct MajorityPromptTemplate;

impl MajorityPromptTemplate {
    /// Ask for the `agents` most relevant specialties, one name per line.
    pub fn selection(question: &QuestionRecord, catalog: &SpecialtyCatalog, agents: usize) -> String {
        let names = catalog
            .entries()
            .iter()
            .map(|e| format!("- {}", e.display_name))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            r#"You are a medical triage expert. Given a clinical question, identify the TOP {agents} medical specialties most relevant to answering it correctly. Do not answer the question.

**Available specialties:**
{names}

**Question:**
{question}

Respond with ONLY the {agents} specialty names, one per line, most relevant first. Use the exact names from the list above."#,
            question = question.question_text,
        )
    }

    /// One specialist answering alone, without seeing the others.
    pub fn agent(question: &QuestionRecord, specialty: &SpecialtyEntry) -> String {
        format!(
            r#"You are a board-certified specialist in {name}.

Analyze this clinical question independently and choose the best option.

{question}

{options}

{format}"#,
            name = specialty.display_name,
            question = question.question_text,
            options = format_options(question),
            format = ANSWER_FORMAT,
        )
    }

    /// Senior review when no option won a majority.
    pub fn synthesis(question: &QuestionRecord, analyses: &[(&SpecialtyEntry, AnswerLetter, &str)]) -> String {
        let rendered = analyses
            .iter()
            .enumerate()
            .map(|(i, (entry, letter, text))| {
                format!(
                    "### Agent {} ({})\nAnswer: {}\nAnalysis: {}",
                    i + 1,
                    entry.display_name,
                    letter,
                    text.trim()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        format!(
            r#"You are a senior medical reviewer. {count} specialists analyzed this clinical question independently but did not reach a majority. Review their analyses and give the final answer.

**Question:**
{question}

**Options:**
{options}

**Specialist analyses:**
{rendered}

{format}"#,
            count = analyses.len(),
            question = question.question_text,
            options = format_options(question),
            format = ANSWER_FORMAT,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::template::tests::sample_question;

    #[test]
    fn test_selection_lists_display_names() {
        let catalog = SpecialtyCatalog::standard();
        let prompt = MajorityPromptTemplate::selection(&sample_question(), &catalog, 3);
        assert!(prompt.contains("TOP 3 medical specialties"));
        assert!(prompt.contains("- Otolaryngology (ENT)"));
        assert!(!prompt.contains("Bacterial meningitis"));
    }

    #[test]
    fn test_synthesis_shows_every_vote() {
        let catalog = SpecialtyCatalog::standard();
        let (cardio, neuro) = (
            catalog.get("cardiology").unwrap(),
            catalog.get("neurology").unwrap(),
        );
        let prompt = MajorityPromptTemplate::synthesis(
            &sample_question(),
            &[(cardio, AnswerLetter::A, "ischemia"), (neuro, AnswerLetter::C, " stroke ")],
        );
        assert!(prompt.contains("2 specialists"));
        assert!(prompt.contains("### Agent 2 (Neurology)\nAnswer: C\nAnalysis: stroke"));
        assert!(prompt.contains("ANSWER: [letter]"));
    }
}
