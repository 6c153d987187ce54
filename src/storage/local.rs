//! Local filesystem storage implementation.
//!
//! Keeps the snapshot as a single JSON file for development and CLI runs.
//! The serverless deployment uses `S3Storage`.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── config.toml           # Watcher configuration
//! └── {snapshot_id}.json    # Last recorded snapshot
//! ```

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Snapshot;
use crate::storage::SnapshotStorage;

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
    snapshot_id: String,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>, snapshot_id: impl Into<String>) -> Self {
        Self {
            root_dir: root_dir.into(),
            snapshot_id: snapshot_id.into(),
        }
    }

    /// Path of the snapshot file.
    pub fn snapshot_path(&self) -> PathBuf {
        self.root_dir.join(format!("{}.json", self.snapshot_id))
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, path: &PathBuf, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            drop(file);
            tokio::fs::rename(&tmp, path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    log::warn!("Failed to remove {}: {}", tmp.display(), cleanup);
                }
            }
            return Err(AppError::Io(e));
        }
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, path: &PathBuf) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl SnapshotStorage for LocalStorage {
    fn snapshot_id(&self) -> &str {
        &self.snapshot_id
    }

    fn location(&self) -> String {
        self.snapshot_path().display().to_string()
    }

    async fn read_snapshot(&self) -> Result<Option<Snapshot>> {
        match self.read_bytes(&self.snapshot_path()).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn write_snapshot(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        self.write_bytes(&self.snapshot_path(), &bytes).await
    }
}
