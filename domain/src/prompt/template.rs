//! Prompt templates for single-call and progressive strategies

use crate::core::question::{AnswerLetter, QuestionRecord};

/// Render options as `A. text` lines.
pub fn format_options(question: &QuestionRecord) -> String {
    question
        .lettered_options()
        .map(|(letter, text)| format!("{}. {}", letter, text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Output contract shared by every free-text final-decision prompt.
pub(crate) const ANSWER_FORMAT: &str = r#"Respond in this EXACT format:
ANSWER: [letter]
REASONING: [brief final justification]"#;

/// Templates for the baseline and progressive-temperature strategies
pub struct PromptTemplate;

impl PromptTemplate {
    /// Zero-shot: question and options only.
    pub fn zero_shot(question: &QuestionRecord) -> String {
        format!(
            "{}\n\n{}\n\nWhat is the answer?",
            question.question_text,
            format_options(question)
        )
    }

    /// Zero-shot with a single role line.
    pub fn zero_shot_physician(question: &QuestionRecord) -> String {
        format!(
            "You are an experienced physician.\n\n{}",
            Self::zero_shot(question)
        )
    }

    /// Single-shot chain of thought with a structured reasoning scaffold.
    pub fn chain_of_thought(question: &QuestionRecord) -> String {
        format!(
            r#"Analyze this medical case using step-by-step reasoning.

{}

{}

**Think through this systematically:**

1. **Identify Key Clinical Features**
   - What are the critical symptoms and signs?
   - What demographic factors are relevant?
   - What is the timeline of the presentation?

2. **Generate Differential Diagnosis**
   - List 2-3 possible conditions
   - For each, note what clinical features support it

3. **Evaluate Each Option**
   - What argues FOR each option?
   - What argues AGAINST each option?

4. **Select Your Answer**
   - State your final answer clearly

Finish with a line of the form `ANSWER: <letter>` (A, B, C, or D)."#,
            question.question_text,
            format_options(question)
        )
    }

    fn case_header(question: &QuestionRecord) -> String {
        format!(
            "Question: {}\n\nOptions:\n{}",
            question.question_text,
            format_options(question)
        )
    }

    /// Opening stage of a progressive chain: broad, high-temperature exploration.
    ///
    /// Parallel branches use this exact prompt, so every branch starts from
    /// identical input.
    pub fn broad_exploration(question: &QuestionRecord) -> String {
        format!(
            r#"You are a medical expert conducting initial diagnostic reasoning.

{}

TASK: Generate a BROAD differential diagnosis. Consider all possibilities, even unlikely ones. Explore diverse reasoning paths.

Provide your initial thoughts and multiple candidate answers with brief reasoning for each."#,
            Self::case_header(question)
        )
    }

    /// Intermediate progressive stage. `step` is the zero-based index among
    /// intermediate stages; steps past the third repeat the deep-analysis task.
    pub fn progressive_step(question: &QuestionRecord, step: usize, previous: &str) -> String {
        let (role, heading, task) = match step {
            0 => (
                "analyzing diagnostic possibilities",
                "PREVIOUS EXPLORATION",
                "For each possibility mentioned above, provide detailed clinical reasoning. What evidence SUPPORTS each diagnosis? What evidence REFUTES it? Consider pathophysiology, clinical presentation, and diagnostic criteria.",
            ),
            1 => (
                "prioritizing diagnoses",
                "EVIDENCE ANALYSIS",
                "Based on the evidence above, RANK the answer options from most to least likely and identify the top 2-3 most probable answers. Which diagnoses best fit the clinical picture?",
            ),
            _ => (
                "conducting detailed evaluation",
                "PRIORITIZED CANDIDATES",
                "Perform a DETAILED comparison of the top candidates. How well does each explain ALL the clinical findings? Are there inconsistencies or red flags? What is the most parsimonious explanation?",
            ),
        };
        format!(
            "You are a medical expert {}.\n\n{}\n\n{}:\n{}\n\nTASK: {}",
            role,
            Self::case_header(question),
            heading,
            previous,
            task
        )
    }

    /// Final zero-temperature decision of a progressive chain.
    pub fn progressive_final(question: &QuestionRecord, previous: &str) -> String {
        format!(
            r#"You are a medical expert making a final diagnostic decision.

{}

COMPREHENSIVE ANALYSIS:
{}

TASK: Based on all the reasoning above, select the SINGLE BEST answer. You must choose ONE option (A, B, C, or D).

{}"#,
            Self::case_header(question),
            previous,
            ANSWER_FORMAT
        )
    }

    /// Merge of independent exploration branches into one superset synthesis.
    pub fn parallel_merge(question: &QuestionRecord, branches: &[String]) -> String {
        let explorations = branches
            .iter()
            .enumerate()
            .map(|(i, b)| format!("=== EXPLORATION {} ===\n{}", i + 1, b))
            .collect::<Vec<_>>()
            .join("\n\n");
        let n = branches.len();
        format!(
            r#"You are a medical expert synthesizing multiple diagnostic explorations.

{header}

MULTIPLE EXPLORATIONS FROM DIFFERENT PERSPECTIVES:
{explorations}

TASK: Synthesize ALL the hypotheses and reasoning from the {n} explorations above into one unified differential. Do not drop information: the synthesis must be a superset of what the explorations contain.

SYNTHESIS PRIORITIES (in order):
1. **CONTRAINDICATIONS & RED FLAGS** mentioned in ANY exploration, flagged prominently.
2. **CONSENSUS FINDINGS**: diagnoses or reasoning shared by several of the {n} explorations.
3. **PATIENT-SPECIFIC FACTORS**: history, comorbidities, medications, special circumstances.
4. **COMPREHENSIVE DIFFERENTIAL**: every unique diagnosis, ranked by how many explorations mention it and by strength of evidence.
5. **CONFLICTS**: where explorations disagree, state both sides and their reasoning.
6. **UNIQUE INSIGHTS** raised by a single exploration when clinically significant.

Start with critical flags, then consensus diagnoses, then the remaining possibilities ranked by likelihood."#,
            header = Self::case_header(question),
            explorations = explorations,
            n = n,
        )
    }

    /// Final decision over a merged synthesis.
    pub fn parallel_final(question: &QuestionRecord, synthesis: &str, branch_count: usize) -> String {
        format!(
            r#"You are a medical expert making a final diagnostic decision based on a comprehensive differential diagnosis.

{}

COMPREHENSIVE DIFFERENTIAL DIAGNOSIS (synthesized from {} independent explorations):
{}

TASK:
1. Review the evidence for and against each option
2. Consider which diagnosis best explains ALL clinical findings
3. Check for critical contraindications or red flags
4. Select the SINGLE BEST answer (A, B, C, or D)

{}"#,
            Self::case_header(question),
            branch_count,
            synthesis,
            ANSWER_FORMAT
        )
    }

    /// Letter heading used when a prompt addresses one option.
    pub fn option_label(question: &QuestionRecord, letter: AnswerLetter) -> String {
        format!("Option {}: {}", letter, question.option(letter))
    }
}
