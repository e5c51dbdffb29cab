//! Question record and answer letter value objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four option letters of a MedQA item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerLetter {
    A,
    B,
    C,
    D,
}

impl AnswerLetter {
    /// All letters in option order.
    pub const ALL: [AnswerLetter; 4] = [Self::A, Self::B, Self::C, Self::D];

    /// Zero-based option index.
    pub fn index(self) -> usize {
        match self {
            Self::A => 0,
            Self::B => 1,
            Self::C => 2,
            Self::D => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'A' => Some(Self::A),
            'B' => Some(Self::B),
            'C' => Some(Self::C),
            'D' => Some(Self::D),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }
}

impl fmt::Display for AnswerLetter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

impl FromStr for AnswerLetter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let mut chars = trimmed.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => {
                Self::from_char(c).ok_or_else(|| format!("'{}' is not one of A-D", trimmed))
            }
            _ => Err(format!("'{}' is not a single option letter", trimmed)),
        }
    }
}

/// A multiple-choice exam question (Value Object)
///
/// Immutable once loaded. Options are stored in A-D order without their
/// letter prefix; [`crate::prompt::format_options`] re-adds the prefixes
/// when a prompt is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: String,
    pub question_text: String,
    pub options: [String; 4],
    pub correct_answer: AnswerLetter,
}

impl QuestionRecord {
    pub fn new(
        id: impl Into<String>,
        question_text: impl Into<String>,
        options: [String; 4],
        correct_answer: AnswerLetter,
    ) -> Self {
        Self {
            id: id.into(),
            question_text: question_text.into(),
            options,
            correct_answer,
        }
    }

    /// Option text for a letter.
    pub fn option(&self, letter: AnswerLetter) -> &str {
        &self.options[letter.index()]
    }

    /// Letters paired with their option text, in order.
    pub fn lettered_options(&self) -> impl Iterator<Item = (AnswerLetter, &str)> {
        AnswerLetter::ALL
            .into_iter()
            .map(move |letter| (letter, self.option(letter)))
    }

    pub fn is_correct(&self, predicted: AnswerLetter) -> bool {
        self.correct_answer == predicted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> QuestionRecord {
        QuestionRecord::new(
            "q00001",
            "A 45-year-old man presents with chest pain.",
            [
                "Aortic dissection".to_string(),
                "Myocardial infarction".to_string(),
                "Pericarditis".to_string(),
                "Pulmonary embolism".to_string(),
            ],
            AnswerLetter::B,
        )
    }

    #[test]
    fn test_letter_from_str() {
        assert_eq!("b".parse::<AnswerLetter>().unwrap(), AnswerLetter::B);
        assert_eq!(" D ".parse::<AnswerLetter>().unwrap(), AnswerLetter::D);
        assert!("E".parse::<AnswerLetter>().is_err());
        assert!("AB".parse::<AnswerLetter>().is_err());
    }

    #[test]
    fn test_letter_index_roundtrip() {
        for letter in AnswerLetter::ALL {
            assert_eq!(AnswerLetter::from_index(letter.index()), Some(letter));
        }
        assert_eq!(AnswerLetter::from_index(4), None);
    }

    #[test]
    fn test_letter_serializes_as_bare_letter() {
        assert_eq!(serde_json::to_string(&AnswerLetter::C).unwrap(), "\"C\"");
    }

    #[test]
    fn test_option_lookup() {
        let q = sample();
        assert_eq!(q.option(AnswerLetter::D), "Pulmonary embolism");
        assert!(q.is_correct(AnswerLetter::B));
        assert!(!q.is_correct(AnswerLetter::A));
        let letters: Vec<_> = q.lettered_options().map(|(l, _)| l).collect();
        assert_eq!(letters, AnswerLetter::ALL.to_vec());
    }
}
