//! Run records: call traces, per-question results and run results.
//!
//! All of these are append-only audit records. A [`CallTrace`] is never
//! modified after creation, and a [`RunResult`] only grows by appending
//! question results in dataset order.

mod result;
mod trace;

pub use result::{QuestionError, QuestionErrorKind, QuestionResult, RunResult};
pub use trace::CallTrace;
