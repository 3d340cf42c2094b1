//! File-backed storage.
//!
//! All keys live in one JSON object file:
//!
//! ```json
//! { "@GoMarket:cart": "[{\"id\":\"p1\", ...}]" }
//! ```
//!
//! - A missing file reads as empty storage
//! - A file that is not a JSON object of strings is [`StorageError::Corrupt`]
//!   on read; a write replaces it with a fresh object
//! - Writes go to a temp file first and are renamed into place
//! - Read-modify-write cycles are serialized by an async mutex

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{KeyValueStorage, StorageError};

/// Storage persisted to a single JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    /// Create a file storage at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Get the path to the storage file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => {
                return Err(StorageError::Read(format!(
                    "cannot read {}: {e}",
                    self.path.display()
                )));
            }
        };

        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            StorageError::Corrupt(format!("cannot parse {}: {e}", self.path.display()))
        })
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::Write(format!("cannot create directory: {e}")))?;
        }

        let content = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Write(format!("cannot serialize entries: {e}")))?;

        let temp_path = self.path.with_extension("tmp");
        {
            let mut file = fs::File::create(&temp_path)
                .await
                .map_err(|e| StorageError::Write(format!("cannot create temp file: {e}")))?;
            file.write_all(content.as_bytes())
                .await
                .map_err(|e| StorageError::Write(format!("cannot write temp file: {e}")))?;
            file.sync_all()
                .await
                .map_err(|e| StorageError::Write(format!("cannot sync to disk: {e}")))?;
        }

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| StorageError::Write(format!("cannot rename temp file: {e}")))?;

        debug!(path = %self.path.display(), keys = entries.len(), "Storage file written");
        Ok(())
    }
}

#[async_trait]
impl KeyValueStorage for FileStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        Ok(entries.remove(key))
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = match self.read_entries().await {
            Ok(entries) => entries,
            Err(StorageError::Corrupt(reason)) => {
                warn!(path = %self.path.display(), %reason, "Replacing corrupt storage file");
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("storage.json"));
        assert_eq!(storage.get_item("@GoMarket:cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_creates_parent_dirs_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("storage.json");

        FileStorage::new(&path).set_item("k", "v").await.unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get_item("k").await.unwrap().as_deref(), Some("v"));
        assert!(!path.with_extension("tmp").exists());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("storage.json"));
        storage.set_item("a", "1").await.unwrap();
        storage.set_item("b", "2").await.unwrap();
        storage.remove_item("a").await.unwrap();

        assert_eq!(storage.get_item("a").await.unwrap(), None);
        assert_eq!(storage.get_item("b").await.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported_on_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get_item("k").await,
            Err(StorageError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn test_set_replaces_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{ truncated").unwrap();

        let storage = FileStorage::new(&path);
        storage.set_item("k", "v").await.unwrap();

        assert_eq!(storage.get_item("k").await.unwrap().as_deref(), Some("v"));
        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get_item("k").await.unwrap().as_deref(), Some("v"));
    }
}
