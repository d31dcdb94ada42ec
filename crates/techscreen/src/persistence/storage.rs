use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Failure classes a storage backend can report.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    #[error("storage quota exceeded")]
    QuotaExceeded,
    #[error("storage access denied: {0}")]
    AccessDenied(String),
    #[error("stored data is corrupted: {0}")]
    Corrupted(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<io::Error> for StorageError {
    fn from(err: io::Error) -> Self {
        // ENOSPC and EDQUOT on Linux.
        if matches!(err.raw_os_error(), Some(28) | Some(122)) {
            return Self::QuotaExceeded;
        }
        match err.kind() {
            io::ErrorKind::PermissionDenied => Self::AccessDenied(err.to_string()),
            io::ErrorKind::InvalidData => Self::Corrupted(err.to_string()),
            _ => Self::Unavailable(err.to_string()),
        }
    }
}

/// Message shown to the user when saving or restoring fails.
pub fn storage_warning(err: &StorageError) -> &'static str {
    match err {
        StorageError::QuotaExceeded => {
            "Storage quota exceeded. Please clear saved data or use a smaller resume file."
        }
        StorageError::AccessDenied(_) => {
            "Unable to access storage. Please check the data directory permissions."
        }
        StorageError::Corrupted(_) => "Saved data is corrupted. Starting fresh session.",
        StorageError::Unavailable(_) => {
            "Failed to save progress. Your session may not be restored if you close this program."
        }
    }
}

/// String key-value backend the snapshot store writes through.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn put(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.root)?;
        let target = self.path_for(key);
        let staging = self.root.join(format!("{key}.json.tmp"));

        let mut file = fs::File::create(&staging)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&staging, &target)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, String>,
    quota_bytes: Option<usize>,
    access_denied: bool,
}

/// Process-local store. Clones share the same entries, so a test can keep a handle while
/// the controller owns another. Supports a byte quota and a simulated permission failure.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        let store = Self::default();
        store.inner.lock().expect("storage mutex poisoned").quota_bytes = Some(quota_bytes);
        store
    }

    pub fn set_access_denied(&self, denied: bool) {
        self.inner.lock().expect("storage mutex poisoned").access_denied = denied;
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        let guard = self.inner.lock().expect("storage mutex poisoned");
        guard.entries.get(key).cloned()
    }

    /// Writes bypassing quota and permission checks, for seeding fixtures.
    pub fn insert_raw(&self, key: &str, value: impl Into<String>) {
        let mut guard = self.inner.lock().expect("storage mutex poisoned");
        guard.entries.insert(key.to_string(), value.into());
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self.inner.lock().expect("storage mutex poisoned");
        if guard.access_denied {
            return Err(StorageError::AccessDenied(format!("read of '{key}' refused")));
        }
        Ok(guard.entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self.inner.lock().expect("storage mutex poisoned");
        if guard.access_denied {
            return Err(StorageError::AccessDenied(format!("write of '{key}' refused")));
        }
        if let Some(quota) = guard.quota_bytes {
            let others: usize = guard
                .entries
                .iter()
                .filter(|(existing, _)| existing.as_str() != key)
                .map(|(existing, stored)| existing.len() + stored.len())
                .sum();
            if others + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded);
            }
        }
        guard.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self.inner.lock().expect("storage mutex poisoned");
        if guard.access_denied {
            return Err(StorageError::AccessDenied(format!("removal of '{key}' refused")));
        }
        guard.entries.remove(key);
        Ok(())
    }
}
