//! Checkpoint file persistence.

use super::state::PipelineState;
use crate::corpus::write_json_atomic;
use crate::error::{PodquoteError, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Loads and commits the pipeline state as one JSON document.
#[derive(Debug, Clone)]
pub struct CheckpointStore {
    path: PathBuf,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the saved state, or a fresh one if no checkpoint exists.
    pub fn load(&self) -> Result<PipelineState> {
        if !self.path.exists() {
            debug!("No checkpoint at {:?}, starting fresh", self.path);
            return Ok(PipelineState::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(|e| {
            PodquoteError::Config(format!(
                "Checkpoint {} is unreadable ({}). Fix or remove it to start fresh.",
                self.path.display(),
                e
            ))
        })
    }

    /// Durably write the full state.
    pub fn commit(&self, state: &PipelineState) -> Result<()> {
        write_json_atomic(&self.path, state)
    }

    /// Delete the checkpoint.
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed checkpoint {:?}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(PodquoteError::persistence(&self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{ErrorEntry, Stage};

    #[test]
    fn test_load_missing_returns_fresh_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("pipeline_checkpoint.json"));
        assert_eq!(store.load().unwrap(), PipelineState::default());
    }

    #[test]
    fn test_commit_then_load_survives_restart() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("output").join("pipeline_checkpoint.json");
        let store = CheckpointStore::new(&path);

        let mut state = PipelineState::default();
        state.begin_run(chrono::Utc::now());
        state.mark_extracted("Ada_Chen", 12, 0.02);
        state.add_error(ErrorEntry::attempt(1, "Bob", Stage::Extraction, 1, "boom".into()));
        store.commit(&state).unwrap();

        let reloaded = CheckpointStore::new(&path).load().unwrap();
        assert_eq!(reloaded, state);
        assert!(reloaded.is_extracted("Ada_Chen"));
        assert_eq!(reloaded.errors.len(), 1);
    }

    #[test]
    fn test_corrupt_checkpoint_is_config_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pipeline_checkpoint.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = CheckpointStore::new(&path).load().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_clear() {
        let dir = tempfile::TempDir::new().unwrap();
        let store = CheckpointStore::new(dir.path().join("cp.json"));
        store.commit(&PipelineState::default()).unwrap();
        assert!(store.exists());
        store.clear().unwrap();
        assert!(!store.exists());
        store.clear().unwrap();
    }
}
