//! Source acquisition: identifier, metadata, and a normalized WAV on disk.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{info, warn};

use voxclip_models::{extract_source_id, SourceMetadata};

use crate::command::{check_dependencies, FfmpegRunner};
use crate::download::{download_audio, fetch_metadata};
use crate::error::MediaResult;
use crate::normalize::{transcode_to_pcm, INTERMEDIATE_SAMPLE_RATE};

/// Output of a successful acquisition.
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub metadata: SourceMetadata,
    /// Mono 16-bit PCM WAV inside the caller's work directory.
    pub wav_path: PathBuf,
}

/// Produces metadata and a normalized WAV for a source URL.
///
/// The WAV is written inside `work_dir`; removing it is the caller's job.
#[async_trait]
pub trait SourceAcquirer: Send + Sync {
    async fn acquire(&self, url: &str, work_dir: &Path) -> MediaResult<Acquisition>;
}

/// Production acquirer backed by yt-dlp and FFmpeg.
#[derive(Debug, Clone)]
pub struct YtDlpAcquirer {
    sample_rate: u32,
    timeout_secs: u64,
    runner: FfmpegRunner,
}

impl YtDlpAcquirer {
    /// Create an acquirer, failing if any external tool is missing.
    pub fn new(timeout_secs: u64) -> MediaResult<Self> {
        check_dependencies()?;
        Ok(Self {
            sample_rate: INTERMEDIATE_SAMPLE_RATE,
            timeout_secs,
            runner: FfmpegRunner::new().with_timeout(timeout_secs),
        })
    }

    /// Override the normalized sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }
}

#[async_trait]
impl SourceAcquirer for YtDlpAcquirer {
    async fn acquire(&self, url: &str, work_dir: &Path) -> MediaResult<Acquisition> {
        let source_id = extract_source_id(url)?;
        let metadata = fetch_metadata(url, &source_id, self.timeout_secs).await?;

        let raw_path = download_audio(url, work_dir, &source_id, self.timeout_secs).await?;
        let wav_path = work_dir.join(format!("{}.wav", source_id));

        let transcoded = transcode_to_pcm(&raw_path, &wav_path, self.sample_rate, &self.runner).await;

        if let Err(e) = tokio::fs::remove_file(&raw_path).await {
            warn!(path = %raw_path.display(), "Failed to remove raw download: {}", e);
        }
        transcoded?;

        info!(
            source_id = %source_id,
            wav = %wav_path.display(),
            "Acquired source audio"
        );

        Ok(Acquisition { metadata, wav_path })
    }
}
