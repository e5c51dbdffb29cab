//! Static specialty catalog and specialist-selection repair.
//!
//! The catalog is the single source of truth for valid specialty ids. Any
//! id produced by a model is checked against it before a specialist is
//! consulted.

pub mod selection;
pub mod specialty;

pub use selection::{ScoreSource, ScoredSpecialty, repair};
pub use specialty::{CaseSignals, SpecialtyCatalog, SpecialtyEntry, SpecialtyType};
