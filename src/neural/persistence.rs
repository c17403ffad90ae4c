//! Learning state persistence
//!
//! The interaction history and weight vector are saved together as a single
//! JSON blob. Callers treat any load failure as a cold start.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::learner::WeightVector;
use super::ledger::InteractionRecord;
use crate::error::{EngineError, Result};

const SNAPSHOT_FILE: &str = "learning.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningSnapshot {
    pub interaction_history: Vec<InteractionRecord>,
    pub weights: WeightVector,
    pub saved_at: DateTime<Utc>,
}

/// Opaque save/load of a [`LearningSnapshot`]
pub trait SnapshotStore {
    /// `Ok(None)` when nothing has been saved yet
    fn load(&self) -> Result<Option<LearningSnapshot>>;
    fn save(&self, snapshot: &LearningSnapshot) -> Result<()>;
}

/// Snapshot stored as `learning.json` inside a directory
pub struct FileSnapshotStore {
    path: PathBuf,
}

impl FileSnapshotStore {
    pub fn new(dir: &Path) -> Self {
        Self { path: dir.join(SNAPSHOT_FILE) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn load(&self) -> Result<Option<LearningSnapshot>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let snapshot = serde_json::from_str(&content)?;
        Ok(Some(snapshot))
    }

    fn save(&self, snapshot: &LearningSnapshot) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = serde_json::to_string_pretty(snapshot)?;
        // Atomic replace
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// In-process store, used by tests and embedders without a filesystem
#[derive(Default)]
pub struct MemorySnapshotStore {
    blob: Mutex<Option<String>>,
}

impl SnapshotStore for MemorySnapshotStore {
    fn load(&self) -> Result<Option<LearningSnapshot>> {
        let blob = self
            .blob
            .lock()
            .map_err(|_| EngineError::Serialization("snapshot lock poisoned".into()))?;
        match blob.as_deref() {
            Some(content) => Ok(Some(serde_json::from_str(content)?)),
            None => Ok(None),
        }
    }

    fn save(&self, snapshot: &LearningSnapshot) -> Result<()> {
        let content = serde_json::to_string(snapshot)?;
        let mut blob = self
            .blob
            .lock()
            .map_err(|_| EngineError::Serialization("snapshot lock poisoned".into()))?;
        *blob = Some(content);
        Ok(())
    }
}
