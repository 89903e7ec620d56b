//! Persisting, transcribing and uploading the clips of a processed source.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use voxclip_models::{Clip, PersistedAudio, PersistedVideo, SourceMetadata};
use voxclip_storage::{clip_key, ObjectStore};
use voxclip_transcribe::Transcriber;

use crate::catalog::Catalog;
use crate::error::WorkerResult;

/// What a publish pass did.
#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub video: PersistedVideo,
    pub records: Vec<PersistedAudio>,
    /// Clip names whose upload failed; they are still recorded, without a URL.
    pub failed_uploads: Vec<String>,
    pub transcribed: usize,
}

/// Saves a freshly processed source and its clips.
#[derive(Clone)]
pub struct ClipPublisher {
    catalog: Arc<dyn Catalog>,
    store: Option<Arc<dyn ObjectStore>>,
    transcriber: Option<Arc<dyn Transcriber>>,
}

impl ClipPublisher {
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            store: None,
            transcriber: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Save `metadata`, then every clip with its transcription and URL.
    ///
    /// Transcription and upload problems are logged and never abort the pass.
    /// Catalog errors do.
    pub async fn publish(
        &self,
        metadata: &SourceMetadata,
        clips: &[Clip],
    ) -> WorkerResult<PublishReport> {
        let video = self.catalog.save_metadata(metadata).await?;
        let source_id = metadata.source_id.as_str();

        let mut records = Vec::with_capacity(clips.len());
        let mut failed_uploads = Vec::new();
        let mut transcribed = 0;

        for clip in clips {
            let transcription = self.transcribe(clip).await;
            if transcription.is_some() {
                transcribed += 1;
            }

            let url = match self.upload(source_id, clip).await {
                Ok(url) => url,
                Err(reason) => {
                    warn!(clip = %clip.clip_name, "Upload failed: {}", reason);
                    failed_uploads.push(clip.clip_name.clone());
                    None
                }
            };

            records.push(
                self.catalog
                    .save_clip(clip, video.id, transcription, url)
                    .await?,
            );
        }

        metrics::counter!("voxclip_clips_published_total").increment(records.len() as u64);
        info!(
            source_id = %source_id,
            clips = records.len(),
            transcribed,
            failed_uploads = failed_uploads.len(),
            "Published source"
        );

        Ok(PublishReport {
            video,
            records,
            failed_uploads,
            transcribed,
        })
    }

    async fn transcribe(&self, clip: &Clip) -> Option<String> {
        let transcriber = self.transcriber.as_ref()?;
        let path = clip.clip_path.as_deref()?;

        match transcriber.transcribe(path).await {
            Ok(text) => text.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!(clip = %clip.clip_name, "Transcription failed: {}", e);
                None
            }
        }
    }

    /// `Ok(None)` when no store is configured.
    async fn upload(&self, source_id: &str, clip: &Clip) -> Result<Option<String>, String> {
        let Some(store) = self.store.as_ref() else {
            return Ok(None);
        };
        let path = clip
            .clip_path
            .as_deref()
            .ok_or_else(|| "clip has no local file".to_string())?;

        store
            .upload(path, &clip_key(source_id, &clip.file_name()))
            .await
            .map(Some)
            .map_err(|e| e.to_string())
    }
}

impl std::fmt::Debug for ClipPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipPublisher")
            .field("store", &self.store.is_some())
            .field("transcriber", &self.transcriber.is_some())
            .finish()
    }
}
