//! services/api/src/adapters/file_store.rs
//!
//! This module contains the file adapter, which is the concrete implementation
//! of the `KeyValueStore` port from the `core` crate. All keys live in a single
//! JSON object on disk, rewritten through a temp file and a rename so a batch
//! is either fully visible or not at all.

use async_trait::async_trait;
use referral_rewards_core::ports::{KeyValueStore, PortError, PortResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A file-backed adapter that implements the `KeyValueStore` port.
pub struct FileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles on the file.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Creates a new `FileStore`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_raw(&self) -> PortResult<Vec<u8>> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => Ok(raw),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(PortError::Persistence(e.to_string())),
        }
    }

    fn parse(raw: &[u8]) -> Result<BTreeMap<String, String>, serde_json::Error> {
        if raw.is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_slice(raw)
    }

    async fn read_all(&self) -> PortResult<BTreeMap<String, String>> {
        let raw = self.read_raw().await?;
        Self::parse(&raw).map_err(|e| {
            PortError::Persistence(format!("{} is not a valid store: {}", self.path.display(), e))
        })
    }

    /// Reads the current entries ahead of a rewrite. A file that no longer
    /// parses starts over from an empty map; the flag reports that it did.
    async fn read_for_update(&self) -> PortResult<(BTreeMap<String, String>, bool)> {
        let raw = self.read_raw().await?;
        match Self::parse(&raw) {
            Ok(entries) => Ok((entries, false)),
            Err(e) => {
                warn!(
                    "Discarding unreadable session store at {}: {}",
                    self.path.display(),
                    e
                );
                Ok((BTreeMap::new(), true))
            }
        }
    }

    async fn write_all(&self, entries: &BTreeMap<String, String>) -> PortResult<()> {
        let encoded = serde_json::to_vec_pretty(entries)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let tmp_path = self.path.with_extension("tmp");
        let mut tmp = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;
        tmp.write_all(&encoded)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;
        tmp.sync_all()
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;
        drop(tmp);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| PortError::Persistence(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// `KeyValueStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        let entries = self.read_all().await?;
        Ok(entries.get(key).cloned())
    }

    async fn write_batch(&self, batch: &[(&str, String)]) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let (mut entries, _) = self.read_for_update().await?;
        for (key, value) in batch {
            entries.insert((*key).to_string(), value.clone());
        }
        self.write_all(&entries).await
    }

    async fn remove_batch(&self, keys: &[&str]) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;
        let (mut entries, discarded) = self.read_for_update().await?;
        let before = entries.len();
        for key in keys {
            entries.remove(*key);
        }
        if entries.len() == before && !discarded {
            return Ok(());
        }
        self.write_all(&entries).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FileStore::new(dir.path().join("session.json"));
        assert_eq!(store.get("user").await.unwrap(), None);
        store.remove_batch(&["user"]).await.unwrap();
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn batch_survives_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");

        let store = FileStore::new(&path);
        store
            .write_batch(&[("isLoggedIn", "true".to_string()), ("user", "{}".to_string())])
            .await
            .unwrap();
        assert!(!dir.path().join("session.tmp").exists());

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("isLoggedIn").await.unwrap().as_deref(), Some("true"));
        assert_eq!(reopened.get("user").await.unwrap().as_deref(), Some("{}"));

        reopened.remove_batch(&["isLoggedIn", "user"]).await.unwrap();
        assert_eq!(store.get("isLoggedIn").await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_persistence_failure() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = FileStore::new(&path);
        assert!(matches!(
            store.get("user").await,
            Err(PortError::Persistence(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_file_is_replaced_by_the_next_batch() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = FileStore::new(&path);
        store.remove_batch(&["isLoggedIn", "user"]).await.unwrap();
        assert_eq!(store.get("user").await.unwrap(), None);

        std::fs::write(&path, b"not json").unwrap();
        store
            .write_batch(&[("isLoggedIn", "true".to_string())])
            .await
            .unwrap();
        assert_eq!(store.get("isLoggedIn").await.unwrap().as_deref(), Some("true"));
    }
}
