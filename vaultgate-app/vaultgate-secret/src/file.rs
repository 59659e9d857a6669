//! File-backed secret storage.
//!
//! All entries live in a single JSON object on disk. Every write replaces the
//! file atomically (temp file + rename) and restricts it to the owner on Unix.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{Error, Result, SecretStorageMethod, SecretStorageStatus, SecretStore};

/// Default file name inside the data directory.
pub const SECRETS_FILE_NAME: &str = "secrets.json";

type Entries = BTreeMap<String, String>;

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    /// Serialises read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Store secrets in `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Store secrets in [`SECRETS_FILE_NAME`] under `data_dir`.
    pub fn in_dir(data_dir: &Path) -> Self {
        Self::new(data_dir.join(SECRETS_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Entries> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_entries(&path)).await?
    }

    async fn save(&self, entries: Entries) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_entries(&path, &entries)).await?
    }
}

fn read_entries(path: &Path) -> Result<Entries> {
    if !path.exists() {
        return Ok(Entries::new());
    }

    let content = std::fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(Entries::new());
    }

    serde_json::from_str(&content).map_err(|e| Error::Corrupted(e.to_string()))
}

fn write_entries(path: &Path, entries: &Entries) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content =
        serde_json::to_vec_pretty(entries).map_err(|e| Error::Internal(e.to_string()))?;

    // Write atomically (write to temp file, then rename)
    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, &content)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(&temp_path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(&temp_path, perms)?;
    }

    std::fs::rename(&temp_path, path)?;
    Ok(())
}

#[async_trait]
impl SecretStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.load().await?;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_string(), value.to_string());
        self.save(entries).await?;
        debug!("Stored secret '{}' in {:?}", key, self.path);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.save(entries).await?;
            debug!("Removed secret '{}' from {:?}", key, self.path);
        }
        Ok(())
    }

    fn status(&self) -> SecretStorageStatus {
        SecretStorageStatus::available(SecretStorageMethod::File)
    }
}
