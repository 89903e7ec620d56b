//! Per-source pipeline orchestration.
//!
//! # Stages
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐   ┌──────────┐
//! │ Acquire  │──►│ Enhance  │──►│ Resample │──►│ Segment  │──►│ Extract  │
//! │ (48kHz)  │   │ (chunks) │   │ (16kHz)  │   │ (VAD)    │   │ (clips)  │
//! └──────────┘   └──────────┘   └──────────┘   └──────────┘   └──────────┘
//!      async        ──────────── spawn_blocking ────────────────────
//! ```
//!
//! Each run gets its own temporary directory under the work dir. The
//! intermediate WAV lives there and is removed when the run ends, whether
//! it succeeded or not.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn, Instrument};

use voxclip_media::{
    enhance_chunked, resample, segment_voice, ClipExtractor, EnergyClassifier,
    EnhancementConfig, EnhancerHandle, FrameClassifier, Frames, SourceAcquirer, Waveform,
    WebRtcClassifier, MAX_PADDING_SECS,
};
use voxclip_models::{extract_source_id, round2, Clip, SourceId, SourceMetadata};

use crate::catalog::Catalog;
use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::SourceLogger;

pub const VIDEO_METADATA_FILE: &str = "video_metadata.json";
pub const CLIP_METADATA_FILE: &str = "clip_metadata.json";

/// Frame classifier used by the VAD stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ClassifierKind {
    /// WebRTC GMM detector; needs an 8/16/32/48 kHz target rate.
    #[default]
    #[value(name = "webrtc")]
    WebRtc,
    /// RMS energy threshold.
    Energy,
}

/// Per-request knobs.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub aggressiveness: u8,
    pub start_padding: f64,
    pub end_padding: f64,
    pub classifier: ClassifierKind,
}

impl PipelineOptions {
    /// Options from the worker defaults.
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            aggressiveness: config.vad_aggressiveness,
            start_padding: config.start_padding,
            end_padding: config.end_padding,
            classifier: ClassifierKind::default(),
        }
    }

    pub fn with_aggressiveness(mut self, level: u8) -> Self {
        self.aggressiveness = level;
        self
    }

    pub fn with_padding(mut self, start: f64, end: f64) -> Self {
        self.start_padding = start;
        self.end_padding = end;
        self
    }

    pub fn with_classifier(mut self, classifier: ClassifierKind) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn validate(&self) -> WorkerResult<()> {
        if self.aggressiveness > 3 {
            return Err(WorkerError::invalid_request(format!(
                "aggressiveness must be 0..=3, got {}",
                self.aggressiveness
            )));
        }
        for (name, value) in [
            ("start_padding", self.start_padding),
            ("end_padding", self.end_padding),
        ] {
            if !(0.0..=MAX_PADDING_SECS).contains(&value) {
                return Err(WorkerError::invalid_request(format!(
                    "{} must be within 0..={} seconds, got {}",
                    name, MAX_PADDING_SECS, value
                )));
            }
        }
        Ok(())
    }
}

/// Result of the duplicate-aware entry point.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub source_id: SourceId,
    /// False when the clips came from the catalog instead of a fresh run.
    pub is_new: bool,
    pub metadata: SourceMetadata,
    pub clips: Vec<Clip>,
}

/// Sequences acquisition, enhancement, segmentation and extraction.
#[derive(Clone)]
pub struct ClipPipeline {
    config: Arc<WorkerConfig>,
    acquirer: Arc<dyn SourceAcquirer>,
    enhancer: Option<Arc<EnhancerHandle>>,
}

impl ClipPipeline {
    pub fn new(
        config: WorkerConfig,
        acquirer: Arc<dyn SourceAcquirer>,
        enhancer: Option<Arc<EnhancerHandle>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            acquirer,
            enhancer,
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run every stage for `url` and return its metadata and accepted clips.
    pub async fn process(
        &self,
        url: &str,
        options: &PipelineOptions,
    ) -> WorkerResult<(SourceMetadata, Vec<Clip>)> {
        self.config.validate()?;
        options.validate()?;
        let source_id = extract_source_id(url)?;
        let logger = SourceLogger::new(&source_id, "acquire");
        let failure_logger = logger.clone();
        let span = logger.create_span();

        let result = async move {
            tokio::fs::create_dir_all(&self.config.work_dir).await?;
            let scratch = tempfile::Builder::new()
                .prefix("voxclip-")
                .tempdir_in(&self.config.work_dir)?;

            logger.log_start(url);
            let acquisition = self.acquirer.acquire(url, scratch.path()).await?;
            let metadata = acquisition.metadata;
            logger.log_completion(metadata.display_title());

            let clips = {
                let config = self.config.clone();
                let enhancer = self.enhancer.clone();
                let options = options.clone();
                let id = metadata.source_id.to_string();
                let wav_path = acquisition.wav_path.clone();

                tokio::task::spawn_blocking(move || {
                    run_signal_chain(&wav_path, &id, &config, &options, enhancer.as_deref())
                })
                .await
                .map_err(|e| WorkerError::processing_failed(format!("pipeline task failed: {e}")))??
            };

            write_sidecars(&self.config.source_dir(metadata.source_id.as_str()), &metadata, &clips)
                .await;

            metrics::counter!("voxclip_sources_processed_total").increment(1);
            logger
                .stage("extract")
                .log_completion(&format!("{} clips", clips.len()));

            drop(scratch);
            Ok::<_, WorkerError>((metadata, clips))
        }
        .instrument(span)
        .await;

        if let Err(e) = &result {
            failure_logger.log_error(&e.to_string());
        }
        result
    }

    /// Like [`ClipPipeline::process`], but answers from `catalog` when the
    /// source was already processed.
    pub async fn process_with_catalog(
        &self,
        url: &str,
        options: &PipelineOptions,
        catalog: &dyn Catalog,
    ) -> WorkerResult<ProcessOutcome> {
        options.validate()?;
        let source_id = SourceId::from(extract_source_id(url)?);

        if catalog.exists(&source_id).await? {
            info!(source_id = %source_id, "Source already processed, loading from catalog");
            let (metadata, clips) = self.load_known(&source_id, url, catalog).await?;
            return Ok(ProcessOutcome {
                source_id,
                is_new: false,
                metadata,
                clips,
            });
        }

        let (metadata, clips) = self.process(url, options).await?;
        Ok(ProcessOutcome {
            source_id,
            is_new: true,
            metadata,
            clips,
        })
    }

    /// Rebuild clip records for a known source without touching its media.
    async fn load_known(
        &self,
        source_id: &SourceId,
        url: &str,
        catalog: &dyn Catalog,
    ) -> WorkerResult<(SourceMetadata, Vec<Clip>)> {
        let metadata = catalog
            .get_video(source_id)
            .await?
            .map(|v| v.metadata)
            .unwrap_or_else(|| SourceMetadata::bare(source_id.clone(), url));

        let source_dir = self.config.source_dir(source_id.as_str());
        let clips = catalog
            .list_clips(source_id)
            .await?
            .into_iter()
            .map(|record| {
                let duration = record.end_secs - record.start_secs;
                Clip {
                    clip_name: record.clip_name().to_string(),
                    start_time: record.start_secs,
                    end_time: record.end_secs,
                    duration: round2(duration),
                    padded_duration: record.padded_duration,
                    clip_path: Some(source_dir.join(&record.filename)),
                }
            })
            .collect();

        Ok((metadata, clips))
    }
}

impl std::fmt::Debug for ClipPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipPipeline")
            .field("config", &self.config)
            .field("enhancer", &self.enhancer)
            .finish()
    }
}

/// The blocking part of a run: read, enhance, resample, segment, extract.
pub fn run_signal_chain(
    wav_path: &Path,
    source_id: &str,
    config: &WorkerConfig,
    options: &PipelineOptions,
    enhancer: Option<&EnhancerHandle>,
) -> WorkerResult<Vec<Clip>> {
    let logger = SourceLogger::new(source_id, "enhance");

    let waveform = Waveform::read_wav(wav_path)?;
    logger.log_start(&format!(
        "{:.1}s at {} Hz",
        waveform.duration_secs(),
        waveform.sample_rate()
    ));

    let waveform = match enhancer {
        Some(handle) => enhance_stage(handle, waveform, &config.enhancement_config(), &logger)?,
        None => {
            logger.log_progress("no enhancement model configured, skipping");
            waveform
        }
    };

    let waveform = resample(waveform, config.target_rate)?;

    let logger = logger.stage("segment");
    let vad_config = config.vad_config(options.aggressiveness);
    let mut classifier: Box<dyn FrameClassifier> = match options.classifier {
        ClassifierKind::WebRtc => Box::new(WebRtcClassifier::new(
            waveform.sample_rate(),
            options.aggressiveness,
        )?),
        ClassifierKind::Energy => {
            Box::new(EnergyClassifier::from_aggressiveness(options.aggressiveness))
        }
    };
    let frames = Frames::new(waveform.samples(), waveform.sample_rate(), vad_config.frame_ms);
    let segments = segment_voice(&frames, classifier.as_mut(), &vad_config)?;
    logger.log_completion(&format!("{} voiced segments", segments.len()));

    let clip_config = config.clip_config(options.start_padding, options.end_padding);
    let extractor = ClipExtractor::new(source_id, &waveform, &clip_config, &config.output_dir);
    Ok(extractor.extract(&segments)?)
}

/// Enhance `waveform`, falling back to it unchanged when the model is
/// unavailable or runs at a different rate.
fn enhance_stage(
    handle: &EnhancerHandle,
    waveform: Waveform,
    config: &EnhancementConfig,
    logger: &SourceLogger,
) -> WorkerResult<Waveform> {
    let rate = waveform.sample_rate();
    let mut pending = Some(waveform);

    let outcome = handle.with_enhancer(|enhancer| {
        if enhancer.sample_rate() != rate {
            return Err(enhancer.sample_rate());
        }
        Ok(pending.take().map(|w| enhance_chunked(enhancer, w, config)))
    });

    match outcome {
        Ok(Ok(Some(result))) => {
            let (enhanced, report) = result?;
            if report.fully_degraded() {
                logger.log_warning("every chunk failed enhancement, using original audio");
            } else {
                logger.log_completion(&format!(
                    "{}/{} chunks enhanced",
                    report.chunks - report.failed_chunks,
                    report.chunks
                ));
            }
            Ok(enhanced)
        }
        Ok(Err(model_rate)) => {
            logger.log_warning(&format!(
                "model expects {} Hz but audio is {} Hz, skipping enhancement",
                model_rate, rate
            ));
            take_pending(pending)
        }
        Ok(Ok(None)) => take_pending(pending),
        Err(e) => {
            logger.log_warning(&format!("enhancement model unavailable, skipping: {}", e));
            take_pending(pending)
        }
    }
}

fn take_pending(pending: Option<Waveform>) -> WorkerResult<Waveform> {
    pending.ok_or_else(|| WorkerError::processing_failed("waveform consumed by failed enhancement"))
}

/// Write `video_metadata.json` and `clip_metadata.json` next to the clips.
async fn write_sidecars(source_dir: &Path, metadata: &SourceMetadata, clips: &[Clip]) {
    if let Err(e) = try_write_sidecars(source_dir, metadata, clips).await {
        warn!(dir = %source_dir.display(), "Failed to write metadata sidecars: {}", e);
    }
}

async fn try_write_sidecars(
    source_dir: &Path,
    metadata: &SourceMetadata,
    clips: &[Clip],
) -> WorkerResult<()> {
    tokio::fs::create_dir_all(source_dir).await?;

    let video_json = serde_json::to_vec_pretty(metadata)?;
    tokio::fs::write(source_dir.join(VIDEO_METADATA_FILE), video_json).await?;

    let by_name: BTreeMap<&str, &Clip> = clips.iter().map(|c| (c.clip_name.as_str(), c)).collect();
    let clips_json = serde_json::to_vec_pretty(&by_name)?;
    tokio::fs::write(source_dir.join(CLIP_METADATA_FILE), clips_json).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxclip_media::{MediaResult, SpeechEnhancer};

    struct Doubler {
        rate: u32,
    }

    impl SpeechEnhancer for Doubler {
        fn sample_rate(&self) -> u32 {
            self.rate
        }

        fn enhance(&mut self, chunk: &[f32]) -> MediaResult<Vec<f32>> {
            Ok(chunk.iter().map(|s| s * 2.0).collect())
        }
    }

    fn logger() -> SourceLogger {
        SourceLogger::new("abcdefghijk", "enhance")
    }

    #[test]
    fn test_options_validation() {
        let options = PipelineOptions::from_config(&WorkerConfig::default());
        assert!(options.validate().is_ok());
        assert!(options.clone().with_aggressiveness(4).validate().is_err());
        assert!(options.clone().with_padding(6.0, 0.5).validate().is_err());
        assert!(options.with_padding(0.0, 5.0).validate().is_ok());
    }

    #[test]
    fn test_enhance_stage_applies_model() {
        let handle = EnhancerHandle::preloaded(Box::new(Doubler { rate: 48000 }));
        let input = Waveform::new(vec![100; 4800], 48000);

        let out = enhance_stage(&handle, input, &EnhancementConfig::default(), &logger()).unwrap();
        assert!(out.samples().iter().all(|&s| (199..=201).contains(&s)));
    }

    #[test]
    fn test_enhance_stage_skips_on_rate_mismatch() {
        let handle = EnhancerHandle::preloaded(Box::new(Doubler { rate: 16000 }));
        let input = Waveform::new(vec![100; 4800], 48000);

        let out =
            enhance_stage(&handle, input.clone(), &EnhancementConfig::default(), &logger()).unwrap();
        assert_eq!(out, input);
    }

    #[test]
    fn test_enhance_stage_skips_when_model_missing() {
        let handle = EnhancerHandle::onnx("/nonexistent/voxclip/model.onnx", 48000);
        let input = Waveform::new(vec![7; 480], 48000);

        let out =
            enhance_stage(&handle, input.clone(), &EnhancementConfig::default(), &logger()).unwrap();
        assert_eq!(out, input);
    }

    #[tokio::test]
    async fn test_sidecars_keyed_by_clip_name() {
        let dir = tempfile::TempDir::new().unwrap();
        let source_dir = dir.path().join("abcdefghijk");
        let metadata = SourceMetadata::bare("abcdefghijk", "https://youtu.be/abcdefghijk");
        let clip = Clip::from_segment(
            "abcdefghijk-001".into(),
            &voxclip_models::VoiceSegment::new(1.0, 6.0),
            1.0,
            0.5,
        );

        write_sidecars(&source_dir, &metadata, &[clip]).await;

        let clips: serde_json::Value = serde_json::from_slice(
            &std::fs::read(source_dir.join(CLIP_METADATA_FILE)).unwrap(),
        )
        .unwrap();
        assert_eq!(clips["abcdefghijk-001"]["padded_duration"], 6.5);
        assert!(source_dir.join(VIDEO_METADATA_FILE).exists());
    }
}
