//! Durable key/value storage.
//!
//! A small string-to-string store in the spirit of browser local storage.
//! [`FileStorage`] keeps every key in one JSON document inside the user's data
//! directory (e.g. `~/.local/share/photo-booth/storage.json` on Linux);
//! [`MemoryStorage`] is used when no such directory exists and in tests.

use crate::error::{AppError, Result};
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

const STORAGE_FILE: &str = "storage.json";

/// String key/value persistence.
///
/// Writes are best-effort; a single user and a single writer are assumed.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-memory storage that forgets everything when dropped.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON file storage.
///
/// The whole document is re-read on every `get` so that an edit made by a
/// previous session is always visible, and rewritten on every `set`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    /// Storage backed by an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Storage in the per-user data directory.
    ///
    /// Returns `None` when the platform has no home directory.
    pub fn in_data_dir() -> Option<Self> {
        ProjectDirs::from("", "enie", "photo-booth")
            .map(|dirs| Self::at(dirs.data_dir().join(STORAGE_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> BTreeMap<String, String> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return BTreeMap::new(),
        };

        serde_json::from_str(&content).unwrap_or_else(|err| {
            tracing::warn!(?err, path = ?self.path, "storage file is corrupt; starting empty");
            BTreeMap::new()
        })
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.read_all().remove(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all();
        entries.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(&entries)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Storage used by the application: the data directory if there is one,
/// otherwise memory only.
pub fn default_storage() -> Box<dyn Storage> {
    match FileStorage::in_data_dir() {
        Some(storage) => {
            tracing::debug!(path = ?storage.path(), "using file storage");
            Box::new(storage)
        }
        None => {
            tracing::warn!("no data directory available; credits will not persist");
            Box::new(MemoryStorage::new())
        }
    }
}

impl Storage for Box<dyn Storage> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_storage_round_trips() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.get("k"), None);
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").as_deref(), Some("v"));
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(STORAGE_FILE);

        let mut first = FileStorage::at(&path);
        first.set("enie_quota", "17").unwrap();

        let second = FileStorage::at(&path);
        assert_eq!(second.get("enie_quota").as_deref(), Some("17"));
    }

    #[test]
    fn file_storage_keeps_other_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::at(dir.path().join(STORAGE_FILE));

        storage.set("a", "1").unwrap();
        storage.set("b", "2").unwrap();

        assert_eq!(storage.get("a").as_deref(), Some("1"));
        assert_eq!(storage.get("b").as_deref(), Some("2"));
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(STORAGE_FILE);
        fs::write(&path, "{ not json").unwrap();

        let mut storage = FileStorage::at(&path);
        assert_eq!(storage.get("enie_quota"), None);

        storage.set("enie_quota", "3").unwrap();
        assert_eq!(storage.get("enie_quota").as_deref(), Some("3"));
    }
}
