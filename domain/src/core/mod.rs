//! Core domain concepts shared across all subdomains.
//!
//! - [`question::QuestionRecord`]: one multiple-choice exam item
//! - [`question::AnswerLetter`]: a normalized option letter (A-D)
//! - [`error`]: parse, validation and dataset record errors

pub mod error;
pub mod question;
pub mod string;
