//! Specialty catalog entries and heuristic relevance scoring

use super::selection::{ScoreSource, ScoredSpecialty};
use crate::core::error::InvalidCatalogValueError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Broad grouping of a specialty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialtyType {
    Generalist,
    Medical,
    Surgical,
}

impl SpecialtyType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Generalist => "generalist",
            Self::Medical => "medical",
            Self::Surgical => "surgical",
        }
    }
}

/// One catalog entry with the metadata used for relevance scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyEntry {
    pub specialty_id: String,
    pub display_name: String,
    pub specialty_type: SpecialtyType,
    pub emergency_weight: f64,
    pub pediatric_weight: f64,
    pub adult_weight: f64,
    pub procedural_signal: f64,
    pub keywords: Vec<String>,
}

/// Vocabulary used to recognize emergency and pediatric cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSignals {
    pub emergency_red_flags: Vec<String>,
    pub pediatric_signals: Vec<String>,
}

impl Default for CaseSignals {
    fn default() -> Self {
        Self {
            emergency_red_flags: [
                "syncope",
                "unstable",
                "diaphoresis",
                "hemoptysis",
                "chest pain",
                "altered mental status",
                "severe bleeding",
                "respiratory distress",
                "shock",
            ]
            .map(String::from)
            .to_vec(),
            pediatric_signals: ["child", "infant", "pediatric", "newborn", "adolescent", "neonate"]
                .map(String::from)
                .to_vec(),
        }
    }
}

static AGE_YEARS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(\d{1,3})[- ]?(?:year|yr)s?[- ]old\b").expect("valid age regex")
});
static AGE_INFANT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b\d{1,3}[- ]?(?:month|week|day)s?[- ]old\b").expect("valid age regex")
});

/// Patients under this age count as pediatric.
const PEDIATRIC_AGE_LIMIT: u32 = 18;

/// The fixed catalog of medical specialties (immutable, shared).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialtyCatalog {
    entries: Vec<SpecialtyEntry>,
    signals: CaseSignals,
}

impl SpecialtyCatalog {
    pub fn new(entries: Vec<SpecialtyEntry>) -> Self {
        Self {
            entries,
            signals: CaseSignals::default(),
        }
    }

    /// The standard 28-specialty catalog.
    pub fn standard() -> Self {
        Self::new(STANDARD.iter().map(SpecialtyDef::to_entry).collect())
    }

    pub fn with_signals(mut self, signals: CaseSignals) -> Self {
        self.signals = signals;
        self
    }

    pub fn signals(&self) -> &CaseSignals {
        &self.signals
    }

    pub fn entries(&self) -> &[SpecialtyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, specialty_id: &str) -> Option<&SpecialtyEntry> {
        self.entries.iter().find(|e| e.specialty_id == specialty_id)
    }

    pub fn contains(&self, specialty_id: &str) -> bool {
        self.get(specialty_id).is_some()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.specialty_id.as_str())
    }

    pub fn generalist_ids(&self) -> impl Iterator<Item = &str> {
        self.entries
            .iter()
            .filter(|e| e.specialty_type == SpecialtyType::Generalist)
            .map(|e| e.specialty_id.as_str())
    }

    /// Check every id against the catalog.
    pub fn validate<S: AsRef<str>>(&self, ids: &[S]) -> Result<(), InvalidCatalogValueError> {
        let invalid: Vec<String> = ids
            .iter()
            .map(AsRef::as_ref)
            .filter(|id| !self.contains(id))
            .map(str::to_string)
            .collect();
        if invalid.is_empty() {
            Ok(())
        } else {
            Err(InvalidCatalogValueError { invalid })
        }
    }

    /// Catalog ids named in free text, at most one per line, in order of
    /// first mention.
    ///
    /// A line names an entry by its display name (case-insensitive) or by
    /// its id as a whole token. The longest matching display name wins.
    pub fn mentioned_ids(&self, text: &str) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for line in text.lines() {
            let lower = line.to_lowercase();
            let tokens: HashSet<&str> = lower
                .split(|c: char| !(c.is_alphanumeric() || c == '_'))
                .filter(|t| !t.is_empty())
                .collect();
            let named = self
                .entries
                .iter()
                .filter(|e| {
                    lower.contains(&e.display_name.to_lowercase()) || tokens.contains(e.specialty_id.as_str())
                })
                .max_by_key(|e| e.display_name.len());
            if let Some(entry) = named
                && !found.contains(&entry.specialty_id)
            {
                found.push(entry.specialty_id.clone());
            }
        }
        found
    }

    /// Whether the question text contains an emergency red flag.
    pub fn is_emergency(&self, question: &str) -> bool {
        let lower = question.to_lowercase();
        self.signals
            .emergency_red_flags
            .iter()
            .any(|flag| lower.contains(&flag.to_lowercase()))
    }

    /// Whether the question describes a pediatric patient.
    pub fn is_pediatric(&self, question: &str) -> bool {
        let lower = question.to_lowercase();
        if self
            .signals
            .pediatric_signals
            .iter()
            .any(|s| lower.contains(&s.to_lowercase()))
        {
            return true;
        }
        if AGE_INFANT.is_match(question) {
            return true;
        }
        AGE_YEARS
            .captures(question)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .is_some_and(|age| age < PEDIATRIC_AGE_LIMIT)
    }

    /// Score every entry from its metadata alone.
    ///
    /// `relevance = 0.6 × keyword coverage + 0.25 × emergency fit + 0.15 × age fit`,
    /// where keyword coverage saturates at three hits. Output is in catalog
    /// order, so equal scores keep a stable ranking.
    pub fn heuristic_scores(&self, question: &str) -> Vec<ScoredSpecialty> {
        let lower = question.to_lowercase();
        let words: HashSet<&str> = question
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let lower_words: HashSet<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        let emergency = self.is_emergency(question);
        let pediatric = self.is_pediatric(question);

        self.entries
            .iter()
            .map(|entry| {
                let hits: Vec<&str> = entry
                    .keywords
                    .iter()
                    .map(String::as_str)
                    .filter(|kw| keyword_matches(kw, &lower, &words, &lower_words))
                    .collect();
                let coverage = (hits.len() as f64 / 3.0).min(1.0);
                let emergency_fit = if emergency { entry.emergency_weight } else { 0.0 };
                let age_fit = if pediatric {
                    entry.pediatric_weight
                } else {
                    entry.adult_weight
                };
                let relevance = (0.6 * coverage + 0.25 * emergency_fit + 0.15 * age_fit).clamp(0.0, 1.0);
                let reason = if hits.is_empty() {
                    "no keyword match".to_string()
                } else {
                    format!("keywords: {}", hits.join(", "))
                };
                ScoredSpecialty::new(&entry.specialty_id, relevance, reason)
                    .with_source(ScoreSource::Heuristic)
            })
            .collect()
    }
}

impl Default for SpecialtyCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

/// Acronyms (`MI`, `PE`) match case-sensitively as whole words, other
/// single words match case-insensitively as whole words (plural allowed),
/// and phrases match as case-insensitive substrings.
fn keyword_matches(
    keyword: &str,
    lower_text: &str,
    words: &HashSet<&str>,
    lower_words: &HashSet<&str>,
) -> bool {
    let is_acronym = keyword.len() <= 4 && keyword.chars().all(|c| c.is_ascii_uppercase());
    if is_acronym {
        return words.contains(keyword);
    }
    let kw = keyword.to_lowercase();
    if kw.contains(' ') {
        lower_text.contains(&kw)
    } else {
        lower_words.contains(kw.as_str()) || lower_words.contains(format!("{}s", kw).as_str())
    }
}

struct SpecialtyDef {
    id: &'static str,
    name: &'static str,
    kind: SpecialtyType,
    /// emergency, pediatric, adult, procedural
    weights: [f64; 4],
    keywords: &'static [&'static str],
}

impl SpecialtyDef {
    fn to_entry(&self) -> SpecialtyEntry {
        let [emergency, pediatric, adult, procedural] = self.weights;
        SpecialtyEntry {
            specialty_id: self.id.to_string(),
            display_name: self.name.to_string(),
            specialty_type: self.kind,
            emergency_weight: emergency,
            pediatric_weight: pediatric,
            adult_weight: adult,
            procedural_signal: procedural,
            keywords: self.keywords.iter().map(|k| k.to_string()).collect(),
        }
    }
}

use SpecialtyType::{Generalist, Medical, Surgical};

const STANDARD: &[SpecialtyDef] = &[
    // Generalists
    SpecialtyDef {
        id: "emergency_medicine",
        name: "Emergency Medicine",
        kind: Generalist,
        weights: [1.0, 0.7, 0.9, 0.3],
        keywords: &["acute", "emergency", "trauma", "unstable", "shock", "syncope", "chest pain", "stroke", "seizure", "overdose", "critical"],
    },
    SpecialtyDef {
        id: "pediatrics",
        name: "Pediatrics",
        kind: Generalist,
        weights: [0.6, 1.0, 0.0, 0.1],
        keywords: &["child", "infant", "newborn", "adolescent", "pediatric", "congenital", "developmental", "vaccination", "growth"],
    },
    SpecialtyDef {
        id: "family_internal_medicine",
        name: "Family/Internal Medicine",
        kind: Generalist,
        weights: [0.4, 0.5, 1.0, 0.1],
        keywords: &["chronic", "primary care", "preventive", "screening", "hypertension", "diabetes", "hyperlipidemia", "wellness"],
    },
    // Medical
    SpecialtyDef {
        id: "neurology",
        name: "Neurology",
        kind: Medical,
        weights: [0.7, 0.6, 0.9, 0.2],
        keywords: &["headache", "seizure", "stroke", "weakness", "numbness", "tremor", "dementia", "multiple sclerosis", "parkinson", "neuropathy", "altered mental status", "coma"],
    },
    SpecialtyDef {
        id: "psychiatry",
        name: "Psychiatry",
        kind: Medical,
        weights: [0.5, 0.6, 0.9, 0.0],
        keywords: &["depression", "anxiety", "psychosis", "bipolar", "schizophrenia", "suicidal", "mania", "delusions", "hallucinations", "behavior"],
    },
    SpecialtyDef {
        id: "dermatology",
        name: "Dermatology",
        kind: Medical,
        weights: [0.2, 0.6, 0.8, 0.3],
        keywords: &["rash", "skin", "lesion", "pruritus", "acne", "melanoma", "psoriasis", "eczema", "dermatitis", "urticaria", "biopsy"],
    },
    SpecialtyDef {
        id: "ophthalmology",
        name: "Ophthalmology",
        kind: Medical,
        weights: [0.3, 0.5, 0.8, 0.5],
        keywords: &["vision", "eye", "blindness", "glaucoma", "cataract", "retina", "diplopia", "visual loss", "red eye"],
    },
    SpecialtyDef {
        id: "ent",
        name: "Otolaryngology (ENT)",
        kind: Medical,
        weights: [0.3, 0.7, 0.7, 0.6],
        keywords: &["ear", "nose", "throat", "hearing loss", "tinnitus", "sinusitis", "vertigo", "dysphagia", "hoarseness"],
    },
    SpecialtyDef {
        id: "obgyn",
        name: "Obstetrics & Gynecology",
        kind: Medical,
        weights: [0.5, 0.0, 0.9, 0.7],
        keywords: &["pregnancy", "vaginal bleeding", "pelvic pain", "menstrual", "prenatal", "labor", "delivery", "menopause", "ovarian"],
    },
    SpecialtyDef {
        id: "cardiology",
        name: "Cardiology",
        kind: Medical,
        weights: [0.8, 0.4, 1.0, 0.4],
        keywords: &["chest pain", "MI", "heart failure", "arrhythmia", "hypertension", "angina", "palpitations", "dyspnea", "edema", "CAD"],
    },
    SpecialtyDef {
        id: "endocrinology",
        name: "Endocrinology",
        kind: Medical,
        weights: [0.5, 0.6, 0.9, 0.1],
        keywords: &["diabetes", "thyroid", "hyperglycemia", "hypoglycemia", "adrenal", "pituitary", "hyperthyroid", "hypothyroid", "DKA"],
    },
    SpecialtyDef {
        id: "gastroenterology",
        name: "Gastroenterology",
        kind: Medical,
        weights: [0.6, 0.5, 0.9, 0.4],
        keywords: &["abdominal pain", "GI bleed", "diarrhea", "constipation", "IBD", "cirrhosis", "hepatitis", "pancreatitis", "GERD"],
    },
    SpecialtyDef {
        id: "hematology",
        name: "Hematology",
        kind: Medical,
        weights: [0.6, 0.6, 0.9, 0.2],
        keywords: &["anemia", "bleeding", "thrombosis", "leukemia", "lymphoma", "coagulation", "DVT", "PE", "thrombocytopenia"],
    },
    SpecialtyDef {
        id: "infectious_disease",
        name: "Infectious Disease",
        kind: Medical,
        weights: [0.7, 0.7, 0.9, 0.1],
        keywords: &["fever", "infection", "sepsis", "HIV", "tuberculosis", "meningitis", "pneumonia", "abscess", "bacteremia"],
    },
    SpecialtyDef {
        id: "nephrology",
        name: "Nephrology",
        kind: Medical,
        weights: [0.6, 0.5, 0.9, 0.3],
        keywords: &["renal failure", "dialysis", "hematuria", "proteinuria", "AKI", "CKD", "electrolyte", "hypertension", "edema"],
    },
    SpecialtyDef {
        id: "oncology",
        name: "Oncology",
        kind: Medical,
        weights: [0.5, 0.5, 0.9, 0.3],
        keywords: &["cancer", "tumor", "malignancy", "chemotherapy", "radiation", "metastasis", "lymphoma", "carcinoma", "mass"],
    },
    SpecialtyDef {
        id: "pulmonology",
        name: "Pulmonology",
        kind: Medical,
        weights: [0.7, 0.6, 0.9, 0.3],
        keywords: &["dyspnea", "cough", "COPD", "asthma", "pneumonia", "respiratory failure", "PE", "pleural effusion", "hypoxia"],
    },
    SpecialtyDef {
        id: "rheumatology",
        name: "Rheumatology",
        kind: Medical,
        weights: [0.3, 0.5, 0.9, 0.2],
        keywords: &["arthritis", "joint pain", "autoimmune", "lupus", "RA", "gout", "vasculitis", "connective tissue", "inflammatory"],
    },
    SpecialtyDef {
        id: "geriatrics",
        name: "Geriatrics",
        kind: Medical,
        weights: [0.5, 0.0, 1.0, 0.1],
        keywords: &["elderly", "dementia", "fall", "frailty", "polypharmacy", "delirium", "geriatric", "aging"],
    },
    SpecialtyDef {
        id: "allergy_immunology",
        name: "Allergy & Immunology",
        kind: Medical,
        weights: [0.5, 0.7, 0.7, 0.1],
        keywords: &["allergy", "anaphylaxis", "asthma", "immunodeficiency", "urticaria", "angioedema", "allergic reaction"],
    },
    SpecialtyDef {
        id: "sleep_medicine",
        name: "Sleep Medicine",
        kind: Medical,
        weights: [0.2, 0.5, 0.8, 0.1],
        keywords: &["insomnia", "sleep apnea", "narcolepsy", "fatigue", "snoring", "hypersomnia"],
    },
    SpecialtyDef {
        id: "urology",
        name: "Urology",
        kind: Medical,
        weights: [0.5, 0.4, 0.9, 0.7],
        keywords: &["urinary", "hematuria", "kidney stone", "prostate", "UTI", "incontinence", "retention", "dysuria", "testicular"],
    },
    SpecialtyDef {
        id: "sports_medicine",
        name: "Sports Medicine",
        kind: Medical,
        weights: [0.3, 0.6, 0.7, 0.4],
        keywords: &["sports injury", "ACL", "concussion", "fracture", "sprain", "strain", "athletic"],
    },
    // Surgical
    SpecialtyDef {
        id: "general_surgery",
        name: "General Surgery",
        kind: Surgical,
        weights: [0.7, 0.5, 0.9, 1.0],
        keywords: &["appendicitis", "cholecystitis", "hernia", "bowel obstruction", "acute abdomen", "peritonitis", "surgical abdomen"],
    },
    SpecialtyDef {
        id: "orthopedic_surgery",
        name: "Orthopedic Surgery",
        kind: Surgical,
        weights: [0.6, 0.6, 0.9, 0.9],
        keywords: &["fracture", "dislocation", "joint pain", "back pain", "trauma", "bone", "ligament", "tendon"],
    },
    SpecialtyDef {
        id: "vascular_surgery",
        name: "Vascular Surgery",
        kind: Surgical,
        weights: [0.8, 0.2, 1.0, 0.9],
        keywords: &["aneurysm", "claudication", "ischemia", "vascular", "arterial", "venous", "AAA", "peripheral vascular"],
    },
    SpecialtyDef {
        id: "plastic_surgery",
        name: "Plastic Surgery",
        kind: Surgical,
        weights: [0.3, 0.5, 0.8, 1.0],
        keywords: &["reconstruction", "burn", "laceration", "cosmetic", "hand surgery", "facial trauma"],
    },
    SpecialtyDef {
        id: "thoracic_surgery",
        name: "Thoracic Surgery",
        kind: Surgical,
        weights: [0.7, 0.3, 0.9, 1.0],
        keywords: &["lung cancer", "esophageal", "mediastinal", "chest trauma", "pneumothorax", "empyema"],
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_shape() {
        let catalog = SpecialtyCatalog::standard();
        assert_eq!(catalog.len(), 28);
        let ids: HashSet<&str> = catalog.ids().collect();
        assert_eq!(ids.len(), 28, "ids must be unique");
        let generalists: Vec<&str> = catalog.generalist_ids().collect();
        assert_eq!(
            generalists,
            vec!["emergency_medicine", "pediatrics", "family_internal_medicine"]
        );
    }

    #[test]
    fn test_weights_in_unit_range() {
        for entry in SpecialtyCatalog::standard().entries() {
            for w in [
                entry.emergency_weight,
                entry.pediatric_weight,
                entry.adult_weight,
                entry.procedural_signal,
            ] {
                assert!((0.0..=1.0).contains(&w), "{}: {}", entry.specialty_id, w);
            }
        }
    }

    #[test]
    fn test_validate_reports_only_invalid_ids() {
        let catalog = SpecialtyCatalog::standard();
        assert!(catalog.validate(&["cardiology", "neurology"]).is_ok());
        let err = catalog
            .validate(&["cardiology", "heart_surgery", "neurology", "brain"])
            .unwrap_err();
        assert_eq!(err.invalid, vec!["heart_surgery", "brain"]);
    }

    #[test]
    fn test_mentioned_ids_from_listing() {
        let catalog = SpecialtyCatalog::standard();
        let text = "1. Infectious Disease\n2) neurology\n- Emergency Medicine\nEmergency Medicine again\nThe patient needs ENT review";
        assert_eq!(
            catalog.mentioned_ids(text),
            ["infectious_disease", "neurology", "emergency_medicine", "ent"]
        );
        assert!(catalog.mentioned_ids("Consult the patient's dentist").is_empty());
    }

    #[test]
    fn test_pediatric_detection() {
        let catalog = SpecialtyCatalog::standard();
        assert!(catalog.is_pediatric("A 6-year-old boy is brought in by his mother"));
        assert!(catalog.is_pediatric("A 3-week-old neonate has jaundice"));
        assert!(!catalog.is_pediatric("A 45-year-old man has chest pain"));
    }

    #[test]
    fn test_heuristic_scores_rank_matching_specialty_first() {
        let catalog = SpecialtyCatalog::standard();
        let question = "A 62-year-old man has crushing chest pain, diaphoresis and palpitations. ECG suggests MI.";
        let scores = catalog.heuristic_scores(question);
        assert_eq!(scores.len(), 28);
        let best = scores
            .iter()
            .max_by(|a, b| a.relevance.total_cmp(&b.relevance))
            .unwrap();
        assert_eq!(best.specialty_id, "cardiology");
        assert!(best.reason.contains("MI"));
    }

    #[test]
    fn test_single_word_keywords_need_whole_word() {
        let catalog = SpecialtyCatalog::standard();
        // "ear" must not match inside "year"
        let scores = catalog.heuristic_scores("A 30-year-old has seizures");
        let ent = scores.iter().find(|s| s.specialty_id == "ent").unwrap();
        assert_eq!(ent.reason, "no keyword match");
        let neuro = scores.iter().find(|s| s.specialty_id == "neurology").unwrap();
        assert_eq!(neuro.reason, "keywords: seizure");
    }

    #[test]
    fn test_acronym_keywords_need_whole_word() {
        let catalog = SpecialtyCatalog::standard();
        // "PE" must not match inside "PERSISTENT"
        let scores = catalog.heuristic_scores("PERSISTENT cough");
        let hema = scores.iter().find(|s| s.specialty_id == "hematology").unwrap();
        assert_eq!(hema.reason, "no keyword match");
    }
}
