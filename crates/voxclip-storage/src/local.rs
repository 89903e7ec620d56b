//! Filesystem-backed object store.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use crate::error::{StorageError, StorageResult};
use crate::store::{validate_key, ObjectStore};

/// Copies uploads under a root directory and returns `file://` URLs.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where `key` lands on disk.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn upload(&self, local_path: &Path, blob_name: &str) -> StorageResult<String> {
        validate_key(blob_name)?;
        if !tokio::fs::try_exists(local_path).await? {
            return Err(StorageError::not_found(local_path.display().to_string()));
        }

        let dest = self.path_for(blob_name);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(local_path, &dest)
            .await
            .map_err(|e| StorageError::upload_failed(format!("{}: {}", dest.display(), e)))?;

        debug!("Stored {} at {}", local_path.display(), dest.display());

        let absolute = tokio::fs::canonicalize(&dest).await?;
        Ok(format!("file://{}", absolute.display()))
    }
}
