//! Prompt templates for graph-of-thoughts nodes

use super::template::{PromptTemplate, format_options};
use crate::core::question::{AnswerLetter, QuestionRecord};

/// Per-node templates for graph-of-thoughts reasoning.
pub struct GraphPromptTemplate;

impl GraphPromptTemplate {
    fn case(question: &QuestionRecord) -> String {
        format!(
            "Question: {}\n\nOptions:\n{}",
            question.question_text,
            format_options(question)
        )
    }

    pub fn initialize(question: &QuestionRecord) -> String {
        format!(
            r#"Analyze this medical question and identify its key clinical features.

{}

Provide a structured analysis:
1. Key symptoms and findings
2. Patient demographics if mentioned
3. Critical diagnostic clues
4. What makes this case challenging

Be concise but thorough."#,
            Self::case(question)
        )
    }

    pub fn hypothesis(question: &QuestionRecord, analysis: &str, letter: AnswerLetter) -> String {
        format!(
            r#"Build the strongest case for ONE answer option.

Clinical analysis:
{analysis}

{case}

Hypothesis under consideration: {label}

Explain why this option could be correct: which findings it explains, what mechanism links them, and under what reading of the case it would be the best answer."#,
            analysis = analysis,
            case = Self::case(question),
            label = PromptTemplate::option_label(question, letter),
        )
    }

    pub fn evidence(question: &QuestionRecord, letter: AnswerLetter, hypothesis: &str) -> String {
        format!(
            r#"Evaluate the evidence for this diagnostic hypothesis.

{case}

Hypothesis ({label}):
{hypothesis}

Analyze:
1. Clinical findings that SUPPORT it
2. Clinical findings that CONTRADICT it
3. Missing information that would confirm or rule it out

Be specific and evidence-based."#,
            case = Self::case(question),
            label = PromptTemplate::option_label(question, letter),
            hypothesis = hypothesis,
        )
    }

    /// Refine one hypothesis. `competitors` holds every other option's
    /// hypothesis and evidence; it is empty when cross-pollination is off.
    pub fn refinement(
        question: &QuestionRecord,
        letter: AnswerLetter,
        hypothesis: &str,
        evidence: &str,
        competitors: &[(AnswerLetter, &str, &str)],
    ) -> String {
        let mut prompt = format!(
            r#"Refine this hypothesis in light of the evidence.

{case}

Hypothesis ({label}):
{hypothesis}

Evidence analysis:
{evidence}
"#,
            case = Self::case(question),
            label = PromptTemplate::option_label(question, letter),
            hypothesis = hypothesis,
            evidence = evidence,
        );

        if !competitors.is_empty() {
            prompt.push_str("\nCompeting hypotheses and their evidence:\n");
            for (other, h, e) in competitors {
                prompt.push_str(&format!(
                    "\n--- Option {} ---\nHypothesis:\n{}\nEvidence:\n{}\n",
                    other, h, e
                ));
            }
        }

        prompt.push_str(
            r#"
Provide:
1. The refined reasoning for this option
2. How it compares with the other options
3. The key discriminating factors"#,
        );
        prompt
    }

    /// Aggregate per-option analyses (refinements, or evidence when
    /// refinement is ablated).
    pub fn aggregation(question: &QuestionRecord, analyses: &[(AnswerLetter, &str)]) -> String {
        let body = analyses
            .iter()
            .map(|(letter, text)| format!("Option {}:\n{}", letter, text))
            .collect::<Vec<_>>()
            .join("\n\n---\n\n");
        format!(
            r#"Synthesize all diagnostic reasoning into one comparative analysis.

Per-option analyses:
{body}

{case}

Provide:
1. A comparative analysis of all options
2. Which option best fits ALL clinical findings
3. What rules out the other options
4. A ranked ordering of the four options

Be deterministic and evidence-based."#,
            body = body,
            case = Self::case(question),
        )
    }

    pub fn decision(question: &QuestionRecord, aggregation: &str) -> String {
        format!(
            r#"Make the final diagnostic decision.

Comprehensive analysis:
{aggregation}

{case}

Respond with JSON only:
{{"answer": "<A, B, C, or D>", "justification": "<2-3 sentences>"}}"#,
            aggregation = aggregation,
            case = Self::case(question),
        )
    }
}
