use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::engine::{Session, SnapshotError};
use crate::error::ValidationError;

#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft i/o failed: {0}")]
    Io(#[from] io::Error),

    #[error("draft is not a valid session snapshot: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("draft rejected: {0}")]
    Invalid(#[from] ValidationError),
}

impl From<SnapshotError> for DraftError {
    fn from(e: SnapshotError) -> Self {
        match e {
            SnapshotError::Serde(e) => DraftError::Serde(e),
            SnapshotError::Invalid(e) => DraftError::Invalid(e),
        }
    }
}

/// Single-slot local store for the in-progress session.
pub trait DraftStore {
    fn load(&self) -> Result<Option<String>, DraftError>;

    fn save(&self, snapshot: &str) -> Result<(), DraftError>;

    fn clear(&self) -> Result<(), DraftError>;

    fn save_session(&self, session: &Session) -> Result<(), DraftError> {
        self.save(&session.to_snapshot()?)
    }

    fn load_session(&self) -> Result<Option<Session>, DraftError> {
        let Some(snapshot) = self.load()? else {
            return Ok(None);
        };
        Ok(Some(Session::from_snapshot(&snapshot)?))
    }
}

/// Draft kept in one JSON file.
#[derive(Debug, Clone)]
pub struct FileDraftStore {
    path: PathBuf,
}

impl FileDraftStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DraftStore for FileDraftStore {
    fn load(&self) -> Result<Option<String>, DraftError> {
        match std::fs::read_to_string(&self.path) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, snapshot: &str) -> Result<(), DraftError> {
        std::fs::write(&self.path, snapshot)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), DraftError> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Draft kept in memory, for callers without local storage.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    slot: Mutex<Option<String>>,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStore for MemoryDraftStore {
    fn load(&self) -> Result<Option<String>, DraftError> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, snapshot: &str) -> Result<(), DraftError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(snapshot.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), DraftError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
