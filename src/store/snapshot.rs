use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cache::CacheEntry;
use crate::models::Profile;

/// Snapshot file name in the snapshot directory
const SNAPSHOT_FILE: &str = "snapshot.json";

/// Persisted view of the identity store: the last known actor plus the
/// live cache entries. Restored optimistically at process start before
/// the first session check confirms the session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub actor: Option<Profile>,
    #[serde(default)]
    pub cache: HashMap<String, CacheEntry>,
}

/// Disk persistence for the identity snapshot.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Load the snapshot from disk, `None` when absent.
    pub fn load(&self) -> Result<Option<Snapshot>> {
        let path = self.snapshot_path();
        if !path.exists() {
            return Ok(None);
        }
        let contents =
            std::fs::read_to_string(&path).context("Failed to read snapshot file")?;
        let snapshot: Snapshot =
            serde_json::from_str(&contents).context("Failed to parse snapshot file")?;
        Ok(Some(snapshot))
    }

    /// Save the snapshot to disk
    pub fn save(&self, snapshot: &Snapshot) -> Result<()> {
        let path = self.snapshot_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(snapshot)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Remove the snapshot file, tolerating its absence.
    pub fn purge(&self) -> Result<()> {
        let path = self.snapshot_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn snapshot_path(&self) -> PathBuf {
        self.dir.join(SNAPSHOT_FILE)
    }
}
