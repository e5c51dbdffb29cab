//! Extraction of structured answers from unreliable model output.
//!
//! - [`answer`]: option-letter extraction (marker → JSON field → tail scan)
//! - [`json`]: tolerant JSON recovery (fences, comments, trailing commas,
//!   truncation detection)

pub mod answer;
pub mod json;

pub use answer::{DEFAULT_ANSWER_FIELDS, parse_answer, parse_answer_with_fields};
pub use json::{extract_json_value, json_string_field, json_string_list, parse_string_list};
