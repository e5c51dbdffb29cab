//! JSON file checkpoint store.
//!
//! Layout of a run directory:
//!
//! ```text
//! <dir>/checkpoint.json   full RunResult with every call trace
//! <dir>/summary.json      RunSummary derived from the same snapshot
//! ```
//!
//! Each file is written to a sibling temp file, synced, then renamed over
//! the previous version, so an interrupted write leaves the last good
//! checkpoint in place.

use async_trait::async_trait;
use medqa_application::{CheckpointError, CheckpointStore};
use medqa_domain::{RunResult, RunSummary};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub const CHECKPOINT_FILE: &str = "checkpoint.json";
pub const SUMMARY_FILE: &str = "summary.json";

/// Checkpoint store rooted at a run directory.
pub struct JsonCheckpointStore {
    dir: PathBuf,
}

impl JsonCheckpointStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn checkpoint_path(&self) -> PathBuf {
        self.dir.join(CHECKPOINT_FILE)
    }

    pub fn summary_path(&self) -> PathBuf {
        self.dir.join(SUMMARY_FILE)
    }

    /// Whether a checkpoint file exists in the directory.
    pub fn exists(&self) -> bool {
        self.checkpoint_path().is_file()
    }
}

async fn write_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), CheckpointError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|e| CheckpointError::Encode(e.to_string()))?;

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(&bytes).await?;
    file.sync_all().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl CheckpointStore for JsonCheckpointStore {
    async fn load(&self) -> Result<Option<RunResult>, CheckpointError> {
        let path = self.checkpoint_path();
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let run: RunResult = serde_json::from_str(&content)
            .map_err(|e| CheckpointError::Corrupt(format!("{}: {}", path.display(), e)))?;
        debug!(
            "Loaded checkpoint {} ({} questions)",
            path.display(),
            run.completed_count()
        );
        Ok(Some(run))
    }

    async fn save(&self, run: &RunResult, summary: &RunSummary) -> Result<(), CheckpointError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        write_atomic(&self.checkpoint_path(), run).await?;
        write_atomic(&self.summary_path(), summary).await?;
        debug!(
            "Saved checkpoint to {} ({} questions)",
            self.dir.display(),
            run.completed_count()
        );
        Ok(())
    }
}
