//! Checkpoint store port
//!
//! The runner is the only writer. Implementations must make `save`
//! atomic: a reader never observes a partially written checkpoint.

use async_trait::async_trait;
use medqa_domain::{RunResult, RunSummary};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("Checkpoint I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Checkpoint is not valid JSON: {0}")]
    Corrupt(String),

    #[error("Failed to encode checkpoint: {0}")]
    Encode(String),
}

#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the stored run, if any.
    async fn load(&self) -> Result<Option<RunResult>, CheckpointError>;

    /// Persist the run and its summary.
    async fn save(&self, run: &RunResult, summary: &RunSummary) -> Result<(), CheckpointError>;
}

/// Store that keeps nothing, for dry runs and tests that ignore persistence.
pub struct NoCheckpoint;

#[async_trait]
impl CheckpointStore for NoCheckpoint {
    async fn load(&self) -> Result<Option<RunResult>, CheckpointError> {
        Ok(None)
    }

    async fn save(&self, _run: &RunResult, _summary: &RunSummary) -> Result<(), CheckpointError> {
        Ok(())
    }
}
