//! Prompt templates for two-agent debate with a judge

use super::template::format_options;
use crate::core::question::QuestionRecord;
use serde::{Deserialize, Serialize};

/// Who is speaking in a debate and how they are framed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebatePersona {
    pub name: &'static str,
    pub role_line: &'static str,
}

impl DebatePersona {
    /// Neutral clinical reasoning agents.
    pub fn clinical_pair() -> (Self, Self) {
        (
            Self {
                name: "Clinical Reasoning Agent A",
                role_line: "You are Clinical Reasoning Agent A.",
            },
            Self {
                name: "Clinical Reasoning Agent B",
                role_line: "You are Clinical Reasoning Agent B.",
            },
        )
    }

    /// Attending physicians with distinct clinical backgrounds.
    pub fn physician_pair() -> (Self, Self) {
        (
            Self {
                name: "Attending Physician A",
                role_line: "You are Attending Physician A, an experienced internist who reasons carefully from pathophysiology.",
            },
            Self {
                name: "Attending Physician B",
                role_line: "You are Attending Physician B, an experienced emergency physician who prioritizes dangerous diagnoses and red flags.",
            },
        )
    }
}

/// One recorded contribution to the debate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateTurn {
    pub round: usize,
    pub speaker: String,
    pub text: String,
}

/// Templates for the debate strategy.
///
/// Every agent prompt carries the complete transcript so far.
pub struct DebatePromptTemplate;

impl DebatePromptTemplate {
    fn render_transcript(transcript: &[DebateTurn]) -> String {
        transcript
            .iter()
            .map(|t| format!("--- Round {} | {} ---\n{}", t.round, t.speaker, t.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn case(question: &QuestionRecord) -> String {
        format!(
            "**Question:** {}\n\n**Options:**\n{}",
            question.question_text,
            format_options(question)
        )
    }

    /// First speaker's opening position.
    pub fn opening(persona: &DebatePersona, question: &QuestionRecord) -> String {
        format!(
            r#"{} Analyze this case and propose your diagnosis.

{}

**Your Task:**
1. Analyze the clinical presentation
2. Generate a differential diagnosis
3. Select your answer and explain your reasoning
4. Be prepared to defend your position

End with `ANSWER: <letter>`."#,
            persona.role_line,
            Self::case(question)
        )
    }

    /// Second speaker's opening, which critiques the first.
    pub fn counter_opening(
        persona: &DebatePersona,
        opponent: &DebatePersona,
        question: &QuestionRecord,
        transcript: &[DebateTurn],
    ) -> String {
        format!(
            r#"{role} Review {opp}'s analysis and provide your own perspective.

{case}

**Debate so far:**
{transcript}

**Your Task:**
1. Critically evaluate {opp}'s reasoning
2. Provide your own diagnostic analysis
3. Agree or disagree with {opp}, and explain why
4. If you disagree, give your alternative answer

End with `ANSWER: <letter>`."#,
            role = persona.role_line,
            opp = opponent.name,
            case = Self::case(question),
            transcript = Self::render_transcript(transcript),
        )
    }

    /// Rebuttal in round `round` (2-based), answering the opponent's latest turn.
    pub fn rebuttal(
        persona: &DebatePersona,
        opponent: &DebatePersona,
        round: usize,
        question: &QuestionRecord,
        transcript: &[DebateTurn],
    ) -> String {
        format!(
            r#"{role} This is Round {round} of the debate.

{case}

**Full debate transcript:**
{transcript}

**Your Task:**
- Consider {opp}'s latest arguments
- Respond to their points
- Refine or defend your position
- You may change your answer if {opp}'s arguments are convincing

End with `ANSWER: <letter>`."#,
            role = persona.role_line,
            round = round,
            opp = opponent.name,
            case = Self::case(question),
            transcript = Self::render_transcript(transcript),
        )
    }

    /// Judge synthesis over the whole debate.
    pub fn judge(
        first: &DebatePersona,
        second: &DebatePersona,
        question: &QuestionRecord,
        transcript: &[DebateTurn],
    ) -> String {
        format!(
            r#"You are the moderator of a clinical debate between {a} and {b}. Provide the final consensus answer.

{case}

**Full debate transcript:**
{transcript}

**Your Task:**
Synthesize both perspectives and provide:
1. The final answer (A, B, C, or D)
2. Justification that incorporates insights from both agents
3. Resolution of any disagreements

**Output Format:**
ANSWER: [A, B, C, or D]
JUSTIFICATION: [Synthesis of both agents' reasoning]"#,
            a = first.name,
            b = second.name,
            case = Self::case(question),
            transcript = Self::render_transcript(transcript),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::template::tests::sample_question;

    fn turn(round: usize, speaker: &str, text: &str) -> DebateTurn {
        DebateTurn {
            round,
            speaker: speaker.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_rebuttal_carries_entire_transcript() {
        let (a, b) = DebatePersona::clinical_pair();
        let transcript = vec![
            turn(1, a.name, "opening A"),
            turn(1, b.name, "opening B"),
            turn(2, a.name, "rebuttal A2"),
        ];
        let prompt = DebatePromptTemplate::rebuttal(&b, &a, 2, &sample_question(), &transcript);
        assert!(prompt.contains("opening A"));
        assert!(prompt.contains("opening B"));
        assert!(prompt.contains("rebuttal A2"));
        assert!(prompt.contains("Round 2 of the debate"));
    }

    #[test]
    fn test_judge_names_both_agents() {
        let (a, b) = DebatePersona::physician_pair();
        let prompt = DebatePromptTemplate::judge(&a, &b, &sample_question(), &[]);
        assert!(prompt.contains("Attending Physician A"));
        assert!(prompt.contains("Attending Physician B"));
        assert!(prompt.contains("ANSWER: [A, B, C, or D]"));
    }

    #[test]
    fn test_opening_uses_persona() {
        let (a, _) = DebatePersona::physician_pair();
        let prompt = DebatePromptTemplate::opening(&a, &sample_question());
        assert!(prompt.starts_with(a.role_line));
    }
}
