//! Snapshot persistence.
//!
//! A snapshot is a whole-file overwrite of a [`Dataset`]. Writes go to a
//! sibling temp file which is fsynced and renamed over the target, so a crash
//! mid-write leaves the previous snapshot intact.

use crate::error::{PubmetaError, Result};
use crate::record::Dataset;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Load a dataset from a JSON snapshot.
///
/// Returns [`PubmetaError::MalformedSnapshot`] if the file is not a JSON
/// array of records, and [`PubmetaError::Io`] if it cannot be read.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let bytes = fs::read(path)?;
    let dataset: Dataset =
        serde_json::from_slice(&bytes).map_err(|source| PubmetaError::MalformedSnapshot {
            path: path.to_path_buf(),
            source,
        })?;
    debug!(path = %path.display(), records = dataset.len(), "Loaded snapshot");
    Ok(dataset)
}

/// Atomically replace the snapshot at `path` with `dataset`.
pub fn save_dataset(path: &Path, dataset: &Dataset) -> Result<()> {
    let payload = serde_json::to_vec_pretty(dataset)?;
    write_atomic(path, &payload)?;
    debug!(path = %path.display(), records = dataset.len(), "Saved snapshot");
    Ok(())
}

/// Write `payload` to a temp file next to `path`, then rename it into place.
pub fn write_atomic(path: &Path, payload: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = temp_path(path);
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(payload)?;
        file.sync_all()?;
    }

    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "snapshot".into());
    name.push(".tmp");
    path.with_file_name(name)
}
