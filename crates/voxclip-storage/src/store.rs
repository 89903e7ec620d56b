//! The upload seam the pipeline publishes through.

use std::path::Path;

use async_trait::async_trait;

use crate::error::{StorageError, StorageResult};

/// Somewhere a local file can be published under a key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `local_path` as `blob_name` and return its URL.
    async fn upload(&self, local_path: &Path, blob_name: &str) -> StorageResult<String>;
}

/// Reject keys that are empty, absolute, or climb out of the bucket root.
pub fn validate_key(key: &str) -> StorageResult<()> {
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::invalid_key(key));
    }
    if key.split('/').any(|part| part.is_empty() || part == "." || part == "..") {
        return Err(StorageError::invalid_key(key));
    }
    Ok(())
}

/// MIME type for a key, by extension.
pub fn content_type_for(key: &str) -> &'static str {
    match key.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "wav" => "audio/wav",
        Some(ext) if ext == "json" => "application/json",
        Some(ext) if ext == "txt" => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Key under which a clip file is published.
pub fn clip_key(source_id: &str, file_name: &str) -> String {
    format!("clips/{}/{}", source_id, file_name)
}
