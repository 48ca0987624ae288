use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use stepin_protocol::UserIdentity;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to access session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Stored session is malformed: {0}")]
    Malformed(String),
}

/// Durable mirror of the signed-in identity.
///
/// Holds at most one entry. Memory is the source of truth; this is only read
/// back when the process starts or when a navigation finds no session.
pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<UserIdentity>, StorageError>;
    fn save(&self, identity: &UserIdentity) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
}

fn parse_entry(raw: &str) -> Result<UserIdentity, StorageError> {
    let identity: UserIdentity =
        serde_json::from_str(raw).map_err(|e| StorageError::Malformed(e.to_string()))?;
    if !identity.is_well_formed() {
        return Err(StorageError::Malformed("identity has no email".to_string()));
    }
    Ok(identity)
}

fn serialize_entry(identity: &UserIdentity) -> Result<String, StorageError> {
    serde_json::to_string(identity).map_err(|e| StorageError::Malformed(e.to_string()))
}

/// Session entry persisted as a JSON file
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StorageError {
        StorageError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl SessionStorage for FileStorage {
    fn load(&self) -> Result<Option<UserIdentity>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => parse_entry(&raw).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn save(&self, identity: &UserIdentity) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        fs::write(&self.path, serialize_entry(identity)?).map_err(|e| self.io_error(e))
    }

    fn clear(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(self.io_error(e)),
            _ => Ok(()),
        }
    }
}

/// In-process storage, keeping the serialized entry like a browser's local storage would
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entry: Mutex<Option<String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an arbitrary raw entry, well-formed or not
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            entry: Mutex::new(Some(raw.into())),
        }
    }

    pub fn raw(&self) -> Option<String> {
        self.entry.lock().ok()?.clone()
    }
}

impl SessionStorage for MemoryStorage {
    fn load(&self) -> Result<Option<UserIdentity>, StorageError> {
        match self.raw() {
            Some(raw) => parse_entry(&raw).map(Some),
            None => Ok(None),
        }
    }

    fn save(&self, identity: &UserIdentity) -> Result<(), StorageError> {
        let raw = serialize_entry(identity)?;
        if let Ok(mut entry) = self.entry.lock() {
            *entry = Some(raw);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        if let Ok(mut entry) = self.entry.lock() {
            *entry = None;
        }
        Ok(())
    }
}
