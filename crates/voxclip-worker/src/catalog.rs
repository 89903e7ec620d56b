//! Persistence collaborator: which sources were processed and their clips.
//!
//! [`JsonCatalog`] keeps everything in one JSON file, rewritten atomically
//! (temp file + rename) after each change. [`MemoryCatalog`] is the same
//! store without the file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use voxclip_models::{Clip, PersistedAudio, PersistedVideo, SourceId, SourceMetadata};

pub type CatalogResult<T> = Result<T, CatalogError>;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Video not found: {0}")]
    VideoNotFound(String),

    #[error("Catalog IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Catalog file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl CatalogError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Existence checks, metadata storage, and clip records.
///
/// Cross-invocation exclusion on the same source is the implementation's
/// job; the pipeline only asks and records.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn exists(&self, source_id: &SourceId) -> CatalogResult<bool>;

    async fn get_video(&self, source_id: &SourceId) -> CatalogResult<Option<PersistedVideo>>;

    /// Store metadata; saving an already known source updates it in place.
    async fn save_metadata(&self, metadata: &SourceMetadata) -> CatalogResult<PersistedVideo>;

    async fn save_clip(
        &self,
        clip: &Clip,
        video_id: Uuid,
        transcription: Option<String>,
        url: Option<String>,
    ) -> CatalogResult<PersistedAudio>;

    /// Clips of a source, ordered by file name.
    async fn list_clips(&self, source_id: &SourceId) -> CatalogResult<Vec<PersistedAudio>>;
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
struct CatalogState {
    #[serde(default)]
    videos: Vec<PersistedVideo>,
    #[serde(default)]
    clips: Vec<PersistedAudio>,
}

impl CatalogState {
    fn video(&self, source_id: &SourceId) -> Option<&PersistedVideo> {
        self.videos
            .iter()
            .find(|v| &v.metadata.source_id == source_id)
    }

    fn upsert_video(&mut self, metadata: &SourceMetadata) -> PersistedVideo {
        if let Some(existing) = self
            .videos
            .iter_mut()
            .find(|v| v.metadata.source_id == metadata.source_id)
        {
            existing.metadata = metadata.clone();
            return existing.clone();
        }
        let video = PersistedVideo::new(metadata.clone());
        self.videos.push(video.clone());
        video
    }

    fn add_clip(
        &mut self,
        clip: &Clip,
        video_id: Uuid,
        transcription: Option<String>,
        url: Option<String>,
    ) -> CatalogResult<PersistedAudio> {
        if !self.videos.iter().any(|v| v.id == video_id) {
            return Err(CatalogError::VideoNotFound(video_id.to_string()));
        }
        let mut record = PersistedAudio::new(clip, video_id, transcription);
        record.url = url;

        // Re-saving a clip of the same video replaces the earlier record.
        self.clips
            .retain(|c| !(c.video_id == video_id && c.filename == record.filename));
        self.clips.push(record.clone());
        Ok(record)
    }

    fn clips_of(&self, source_id: &SourceId) -> Vec<PersistedAudio> {
        let Some(video) = self.video(source_id) else {
            return Vec::new();
        };
        let mut clips: Vec<_> = self
            .clips
            .iter()
            .filter(|c| c.video_id == video.id)
            .cloned()
            .collect();
        clips.sort_by(|a, b| a.filename.cmp(&b.filename));
        clips
    }
}

/// In-memory catalog for tests and one-off runs.
#[derive(Debug, Default)]
pub struct MemoryCatalog {
    state: Mutex<CatalogState>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Catalog for MemoryCatalog {
    async fn exists(&self, source_id: &SourceId) -> CatalogResult<bool> {
        Ok(self.state.lock().await.video(source_id).is_some())
    }

    async fn get_video(&self, source_id: &SourceId) -> CatalogResult<Option<PersistedVideo>> {
        Ok(self.state.lock().await.video(source_id).cloned())
    }

    async fn save_metadata(&self, metadata: &SourceMetadata) -> CatalogResult<PersistedVideo> {
        Ok(self.state.lock().await.upsert_video(metadata))
    }

    async fn save_clip(
        &self,
        clip: &Clip,
        video_id: Uuid,
        transcription: Option<String>,
        url: Option<String>,
    ) -> CatalogResult<PersistedAudio> {
        self.state
            .lock()
            .await
            .add_clip(clip, video_id, transcription, url)
    }

    async fn list_clips(&self, source_id: &SourceId) -> CatalogResult<Vec<PersistedAudio>> {
        Ok(self.state.lock().await.clips_of(source_id))
    }
}

/// Catalog persisted to a single JSON file.
#[derive(Debug)]
pub struct JsonCatalog {
    path: PathBuf,
    state: Mutex<CatalogState>,
}

impl JsonCatalog {
    /// Open the catalog at `path`, starting empty when the file is missing.
    pub async fn open(path: impl Into<PathBuf>) -> CatalogResult<Self> {
        let path = path.into();
        let state = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CatalogState::default(),
            Err(e) => return Err(CatalogError::io(&path, e)),
        };

        debug!(path = %path.display(), "Opened catalog");
        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, state: &CatalogState) -> CatalogResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CatalogError::io(parent, e))?;
        }

        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| CatalogError::io(&tmp, e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| CatalogError::io(&self.path, e))?;
        Ok(())
    }
}

#[async_trait]
impl Catalog for JsonCatalog {
    async fn exists(&self, source_id: &SourceId) -> CatalogResult<bool> {
        Ok(self.state.lock().await.video(source_id).is_some())
    }

    async fn get_video(&self, source_id: &SourceId) -> CatalogResult<Option<PersistedVideo>> {
        Ok(self.state.lock().await.video(source_id).cloned())
    }

    async fn save_metadata(&self, metadata: &SourceMetadata) -> CatalogResult<PersistedVideo> {
        let mut state = self.state.lock().await;
        let video = state.upsert_video(metadata);
        self.persist(&state).await?;
        Ok(video)
    }

    async fn save_clip(
        &self,
        clip: &Clip,
        video_id: Uuid,
        transcription: Option<String>,
        url: Option<String>,
    ) -> CatalogResult<PersistedAudio> {
        let mut state = self.state.lock().await;
        let record = state.add_clip(clip, video_id, transcription, url)?;
        self.persist(&state).await?;
        Ok(record)
    }

    async fn list_clips(&self, source_id: &SourceId) -> CatalogResult<Vec<PersistedAudio>> {
        Ok(self.state.lock().await.clips_of(source_id))
    }
}
