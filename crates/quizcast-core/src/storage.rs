//! Durable key/value storage.
//!
//! Mirrors the browser's local storage: string keys, string values, no
//! transactions. Values written here survive a restart so a participant can
//! resume the same quiz session.

use std::{
    collections::BTreeMap,
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use tracing::warn;

use crate::error::StorageError;

/// Well-known storage keys.
pub mod keys {
    /// Current participant session (JSON `{quizId, quizUserId}`).
    pub const CURRENT_QUIZ: &str = "quiz.current";
    /// Last join code entered.
    pub const JOIN_CODE: &str = "quiz.join_code";
    /// Last display name, base64-obfuscated.
    pub const DISPLAY_NAME: &str = "quiz.display_name";
    /// Bearer token used when the session cookie is not accepted.
    pub const AUTH_TOKEN: &str = "auth.token";
}

/// String key/value store.
pub trait Storage: Send + Sync {
    /// Value for `key`, if present.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: Storage + ?Sized> Storage for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}

/// In-memory storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).contains_key(key)
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).remove(key);
        Ok(())
    }
}

/// Storage backed by a JSON object file.
///
/// The whole map is rewritten on every change, via a sibling temp file and a
/// rename so a crash never leaves a half-written file behind.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open (or lazily create) the storage file at `path`.
    ///
    /// A corrupt file is discarded with a warning; the next write replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                warn!(path = %path.display(), %err, "discarding corrupt storage file");
                BTreeMap::new()
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, entries: Mutex::new(entries) })
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.lock().unwrap_or_else(PoisonError::into_inner).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_clones_share_state() {
        let a = MemoryStorage::new();
        let b = a.clone();
        a.set(keys::JOIN_CODE, "AB12CD").unwrap();
        assert_eq!(b.get(keys::JOIN_CODE).unwrap().as_deref(), Some("AB12CD"));

        b.remove(keys::JOIN_CODE).unwrap();
        assert!(!a.contains(keys::JOIN_CODE));
        assert!(a.is_empty());
    }

    #[test]
    fn removing_missing_key_is_ok() {
        let storage = MemoryStorage::new();
        assert!(storage.remove("nope").is_ok());
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set(keys::CURRENT_QUIZ, r#"{"quizId":"q1","quizUserId":"u1"}"#).unwrap();
        storage.set(keys::JOIN_CODE, "AB12CD").unwrap();
        storage.remove(keys::JOIN_CODE).unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(
            reopened.get(keys::CURRENT_QUIZ).unwrap().as_deref(),
            Some(r#"{"quizId":"q1","quizUserId":"u1"}"#)
        );
        assert_eq!(reopened.get(keys::JOIN_CODE).unwrap(), None);
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "{not json").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get(keys::CURRENT_QUIZ).unwrap(), None);

        storage.set(keys::JOIN_CODE, "XY98ZW").unwrap();
        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get(keys::JOIN_CODE).unwrap().as_deref(), Some("XY98ZW"));
    }

    #[test]
    fn file_storage_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let storage = FileStorage::open(&path).unwrap();
        storage.set("k", "v").unwrap();
        assert!(path.exists());
    }
}
