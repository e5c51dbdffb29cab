//! Specialist selection repair.
//!
//! [`repair`] is the only place invalid or missing specialist selections are
//! fixed. It is a pure function so it can be exercised without a model.

use super::specialty::SpecialtyCatalog;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Where a relevance score came from. Planner scores rank ahead of
/// heuristic ones during backfill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoreSource {
    #[default]
    Planner,
    Heuristic,
}

/// A catalog entry scored for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSpecialty {
    pub specialty_id: String,
    pub relevance: f64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub source: ScoreSource,
}

impl ScoredSpecialty {
    pub fn new(specialty_id: impl Into<String>, relevance: f64, reason: impl Into<String>) -> Self {
        Self {
            specialty_id: specialty_id.into(),
            relevance,
            reason: reason.into(),
            source: ScoreSource::Planner,
        }
    }

    pub fn with_source(mut self, source: ScoreSource) -> Self {
        self.source = source;
        self
    }
}

/// Repair a specialist selection so it holds exactly `k` valid, distinct
/// catalog ids (or every valid candidate, if fewer exist).
///
/// 1. Drop ids not in `catalog` and duplicates, keeping the original order.
/// 2. Truncate to `k`.
/// 3. Backfill from `scored` entries that are valid and not yet selected,
///    ordered by source (planner first) then relevance descending; ties keep
///    their order in `scored`.
///
/// Applying `repair` to its own output returns the same selection.
pub fn repair<S: AsRef<str>>(
    selection: &[S],
    catalog: &SpecialtyCatalog,
    scored: &[ScoredSpecialty],
    k: usize,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut repaired: Vec<String> = selection
        .iter()
        .map(AsRef::as_ref)
        .filter(|id| catalog.contains(id))
        .filter(|id| seen.insert(id.to_string()))
        .map(str::to_string)
        .collect();
    repaired.truncate(k);

    if repaired.len() < k {
        let mut candidates: Vec<&ScoredSpecialty> = scored
            .iter()
            .filter(|s| catalog.contains(&s.specialty_id))
            .collect();
        candidates.sort_by(|a, b| {
            a.source
                .cmp(&b.source)
                .then_with(|| b.relevance.total_cmp(&a.relevance))
        });
        for candidate in candidates {
            if repaired.len() >= k {
                break;
            }
            if seen.insert(candidate.specialty_id.clone()) {
                repaired.push(candidate.specialty_id.clone());
            }
        }
    }

    repaired
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored() -> Vec<ScoredSpecialty> {
        vec![
            ScoredSpecialty::new("cardiology", 0.95, "chest pain"),
            ScoredSpecialty::new("emergency_medicine", 0.9, "unstable"),
            ScoredSpecialty::new("pulmonology", 0.7, "dyspnea"),
            ScoredSpecialty::new("vascular_surgery", 0.8, "dissection"),
            ScoredSpecialty::new("hematology", 0.4, "anticoagulation"),
            ScoredSpecialty::new("gastroenterology", 0.3, "epigastric"),
            ScoredSpecialty::new("made_up_specialty", 0.99, "hallucinated"),
        ]
    }

    #[test]
    fn test_one_invalid_id_is_backfilled_with_best_remaining() {
        let catalog = SpecialtyCatalog::standard();
        let selection = [
            "cardiology",
            "emergency_medicine",
            "cardiothoracic_medicine",
            "pulmonology",
            "hematology",
        ];
        let repaired = repair(&selection, &catalog, &scored(), 5);

        assert_eq!(
            repaired,
            vec![
                "cardiology",
                "emergency_medicine",
                "pulmonology",
                "hematology",
                "vascular_surgery",
            ]
        );
        assert!(catalog.validate(&repaired).is_ok());
    }

    #[test]
    fn test_repair_is_idempotent() {
        let catalog = SpecialtyCatalog::standard();
        let selection = ["cardiology", "bogus", "cardiology", "neurology"];
        let once = repair(&selection, &catalog, &scored(), 5);
        let twice = repair(&once, &catalog, &scored(), 5);
        assert_eq!(once, twice);
        assert_eq!(once.len(), 5);
    }

    #[test]
    fn test_duplicates_removed_order_kept() {
        let catalog = SpecialtyCatalog::standard();
        let repaired = repair(&["neurology", "ent", "neurology"], &catalog, &[], 5);
        assert_eq!(repaired, vec!["neurology", "ent"]);
    }

    #[test]
    fn test_truncates_to_k() {
        let catalog = SpecialtyCatalog::standard();
        let selection = ["neurology", "ent", "urology", "oncology"];
        assert_eq!(
            repair(&selection, &catalog, &scored(), 2),
            vec!["neurology", "ent"]
        );
    }

    #[test]
    fn test_planner_scores_rank_before_heuristics() {
        let catalog = SpecialtyCatalog::standard();
        let candidates = vec![
            ScoredSpecialty::new("oncology", 0.99, "").with_source(ScoreSource::Heuristic),
            ScoredSpecialty::new("urology", 0.2, ""),
        ];
        assert_eq!(repair::<&str>(&[], &catalog, &candidates, 1), vec!["urology"]);
    }

    #[test]
    fn test_invalid_scored_entries_never_backfilled() {
        let catalog = SpecialtyCatalog::standard();
        let repaired = repair(&["nope"], &catalog, &scored(), 1);
        assert_eq!(repaired, vec!["cardiology"]);
    }
}
