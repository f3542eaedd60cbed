//! Periodic snapshotting of an in-progress dataset.

use crate::error::{PubmetaError, Result};
use crate::record::Dataset;
use crate::store::save_dataset;
use std::path::PathBuf;
use tracing::info;

/// Default number of processed records between snapshots.
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 5;

/// Overwrites the snapshot with the full accumulator every `interval` records.
///
/// Data loss on interruption is bounded by `interval - 1` records.
#[derive(Debug)]
pub struct Checkpointer {
    path: PathBuf,
    interval: usize,
    processed: usize,
    writes: usize,
}

impl Checkpointer {
    pub fn new(path: impl Into<PathBuf>, interval: usize) -> Result<Self> {
        if interval == 0 {
            return Err(PubmetaError::Config(
                "checkpoint interval must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            path: path.into(),
            interval,
            processed: 0,
            writes: 0,
        })
    }

    /// Number of snapshots written so far.
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Count one processed record; persists when the interval boundary is hit.
    ///
    /// Returns whether a snapshot was written.
    pub fn record(&mut self, dataset: &Dataset) -> Result<bool> {
        self.processed += 1;
        if self.processed % self.interval != 0 {
            return Ok(false);
        }
        save_dataset(&self.path, dataset)?;
        self.writes += 1;
        info!(
            processed = self.processed,
            records = dataset.len(),
            path = %self.path.display(),
            "Checkpoint saved"
        );
        Ok(true)
    }

    /// Final unconditional snapshot.
    pub fn finish(&mut self, dataset: &Dataset) -> Result<()> {
        save_dataset(&self.path, dataset)?;
        self.writes += 1;
        Ok(())
    }
}
