//! Vote counting for strategies that poll independent agents.

use crate::core::question::AnswerLetter;
use serde::{Deserialize, Serialize};

/// Per-letter vote counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    counts: [usize; 4],
}

impl VoteTally {
    pub fn from_votes(votes: &[AnswerLetter]) -> Self {
        let mut tally = Self::default();
        for vote in votes {
            tally.counts[vote.index()] += 1;
        }
        tally
    }

    pub fn count(&self, letter: AnswerLetter) -> usize {
        self.counts[letter.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Letter holding more than half of all votes.
    pub fn majority(&self) -> Option<AnswerLetter> {
        let total = self.total();
        AnswerLetter::ALL
            .into_iter()
            .find(|letter| self.count(*letter) * 2 > total)
    }
}
