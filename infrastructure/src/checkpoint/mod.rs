//! Checkpoint persistence.

mod json_store;

pub use json_store::{CHECKPOINT_FILE, JsonCheckpointStore, SUMMARY_FILE};
