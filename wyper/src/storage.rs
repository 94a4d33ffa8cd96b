//! String key-value storage behind the local store.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use log::debug;
use tempfile::NamedTempFile;

/// Keys wyper persists under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    Posts,
    Chat,
    Draft,
    Theme,
    SessionUser,
}

impl StorageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Posts => "wyper_posts",
            StorageKey::Chat => "wyper_chat",
            StorageKey::Draft => "wyper_draft",
            StorageKey::Theme => "theme",
            StorageKey::SessionUser => "user",
        }
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: StorageKey) -> Result<Option<String>>;
    fn set(&self, key: StorageKey, value: &str) -> Result<()>;
    fn remove(&self, key: StorageKey) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        Ok(entries.get(&key).cloned())
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        entries.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory storage lock poisoned"))?;
        entries.remove(&key);
        Ok(())
    }
}

/// One file per key under a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: PathBuf) -> Result<Self> {
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create data directory {}", root.display()))?;
        debug!("file storage rooted at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: StorageKey) -> PathBuf {
        self.root.join(key.as_str())
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: StorageKey) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        let path = self.path_for(key);
        // write to a sibling temp file and rename so readers never see half a value
        let mut file = NamedTempFile::new_in(&self.root)
            .with_context(|| format!("Failed to create temp file in {}", self.root.display()))?;
        file.write_all(value.as_bytes())?;
        file.flush()?;
        file.persist(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(storage: &dyn KeyValueStore) {
        assert_eq!(storage.get(StorageKey::Draft).unwrap(), None);
        storage.set(StorageKey::Draft, "first").unwrap();
        storage.set(StorageKey::Draft, "second").unwrap();
        assert_eq!(
            storage.get(StorageKey::Draft).unwrap().as_deref(),
            Some("second")
        );
        assert_eq!(storage.get(StorageKey::Theme).unwrap(), None);
        storage.remove(StorageKey::Draft).unwrap();
        storage.remove(StorageKey::Draft).unwrap();
        assert_eq!(storage.get(StorageKey::Draft).unwrap(), None);
    }

    #[test]
    fn memory_storage_roundtrip() {
        exercise(&MemoryStorage::new());
    }

    #[test]
    fn file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("data")).unwrap();
        exercise(&storage);
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileStorage::new(dir.path().to_path_buf())
            .unwrap()
            .set(StorageKey::Theme, "light")
            .unwrap();

        let reopened = FileStorage::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(
            reopened.get(StorageKey::Theme).unwrap().as_deref(),
            Some("light")
        );
        assert!(dir.path().join("theme").exists());
    }
}
