//! End-to-end pipeline runs against a synthetic source.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;

use voxclip_media::{
    write_pcm_wav, Acquisition, AcquisitionKind, EnhancerHandle, MediaError, MediaResult,
    SourceAcquirer, SpeechEnhancer, Waveform,
};
use voxclip_models::{SourceId, SourceMetadata};
use voxclip_worker::{
    Catalog, ClassifierKind, ClipPipeline, ClipPublisher, MemoryCatalog, PipelineOptions,
    WorkerConfig, WorkerError,
};

const URL: &str = "https://www.youtube.com/watch?v=abcdefghijk";
const SOURCE_RATE: u32 = 48000;

/// 20 s of silence with a 5 s utterance at 5-10 s and a 1 s blip at 12-13 s.
fn synthetic_source() -> Vec<i16> {
    let len = 20 * SOURCE_RATE as usize;
    (0..len)
        .map(|i| {
            let t = i as f64 / SOURCE_RATE as f64;
            let voiced = (5.0..10.0).contains(&t) || (12.0..13.0).contains(&t);
            if voiced {
                (0.3 * (2.0 * std::f64::consts::PI * 220.0 * t).sin() * i16::MAX as f64) as i16
            } else {
                0
            }
        })
        .collect()
}

#[derive(Default)]
struct SyntheticAcquirer {
    calls: AtomicUsize,
}

#[async_trait]
impl SourceAcquirer for SyntheticAcquirer {
    async fn acquire(&self, url: &str, work_dir: &Path) -> MediaResult<Acquisition> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let id = voxclip_models::extract_source_id(url)?;
        let wav_path = work_dir.join(format!("{}.wav", id));
        write_pcm_wav(&wav_path, &synthetic_source(), SOURCE_RATE)?;

        let mut metadata = SourceMetadata::bare(id, url);
        metadata.title = Some("Synthetic".into());
        metadata.duration_secs = Some(20.0);
        Ok(Acquisition { metadata, wav_path })
    }
}

struct PrivateSource;

#[async_trait]
impl SourceAcquirer for PrivateSource {
    async fn acquire(&self, _url: &str, work_dir: &Path) -> MediaResult<Acquisition> {
        // Leave a partial artifact behind to check cleanup.
        std::fs::write(work_dir.join("partial.webm"), b"....")?;
        Err(MediaError::acquisition(
            AcquisitionKind::Private,
            "Private video",
        ))
    }
}

struct BrokenModel;

impl SpeechEnhancer for BrokenModel {
    fn sample_rate(&self) -> u32 {
        SOURCE_RATE
    }

    fn enhance(&mut self, _chunk: &[f32]) -> MediaResult<Vec<f32>> {
        Err(MediaError::enhancement("inference failed"))
    }
}

struct Harness {
    _root: TempDir,
    config: WorkerConfig,
}

impl Harness {
    fn new() -> Self {
        let root = TempDir::new().unwrap();
        let config = WorkerConfig::default()
            .with_work_dir(root.path().join("work"))
            .with_output_dir(root.path().join("out"));
        Self {
            _root: root,
            config,
        }
    }

    /// Energy classifier throughout: WebRTC finds no speech in a pure tone.
    fn options(&self) -> PipelineOptions {
        PipelineOptions::from_config(&self.config).with_classifier(ClassifierKind::Energy)
    }

    fn work_dir_is_empty(&self) -> bool {
        std::fs::read_dir(&self.config.work_dir)
            .map(|mut entries| entries.next().is_none())
            .unwrap_or(true)
    }
}

#[tokio::test]
async fn test_process_cuts_one_clip_and_cleans_up() {
    let harness = Harness::new();
    let pipeline = ClipPipeline::new(
        harness.config.clone(),
        Arc::new(SyntheticAcquirer::default()),
        None,
    );

    let (metadata, clips) = pipeline.process(URL, &harness.options()).await.unwrap();

    assert_eq!(metadata.source_id.as_str(), "abcdefghijk");
    // The 12-13 s blip is too short to become a clip.
    assert_eq!(clips.len(), 1);

    let clip = &clips[0];
    assert_eq!(clip.clip_name, "abcdefghijk-001");
    assert!((4.7..=5.2).contains(&clip.start_time), "start {}", clip.start_time);
    assert!((10.0..=10.6).contains(&clip.end_time), "end {}", clip.end_time);
    assert_eq!(clip.padded_duration, voxclip_models::round2(clip.duration + 1.5));

    let path = clip.clip_path.as_ref().unwrap();
    assert_eq!(path, &harness.config.source_dir("abcdefghijk").join("abcdefghijk-001.wav"));
    let written = Waveform::read_wav(path).unwrap();
    assert_eq!(written.sample_rate(), 16000);
    assert!((written.duration_secs() - clip.padded_duration).abs() < 0.05);

    let source_dir = harness.config.source_dir("abcdefghijk");
    assert!(source_dir.join("video_metadata.json").exists());
    assert!(source_dir.join("clip_metadata.json").exists());

    assert!(harness.work_dir_is_empty());
}

#[tokio::test]
async fn test_failing_enhancer_falls_back_to_original_audio() {
    let harness = Harness::new();
    let plain = ClipPipeline::new(
        harness.config.clone(),
        Arc::new(SyntheticAcquirer::default()),
        None,
    );
    let with_broken_model = ClipPipeline::new(
        harness.config.clone(),
        Arc::new(SyntheticAcquirer::default()),
        Some(Arc::new(EnhancerHandle::preloaded(Box::new(BrokenModel)))),
    );

    let (_, expected) = plain.process(URL, &harness.options()).await.unwrap();
    let (_, actual) = with_broken_model
        .process(URL, &harness.options())
        .await
        .unwrap();

    let bounds = |clips: &[voxclip_models::Clip]| {
        clips
            .iter()
            .map(|c| (c.clip_name.clone(), c.start_time, c.end_time))
            .collect::<Vec<_>>()
    };
    assert_eq!(bounds(&actual), bounds(&expected));
}

#[tokio::test]
async fn test_known_source_is_served_from_catalog() {
    let harness = Harness::new();
    let acquirer = Arc::new(SyntheticAcquirer::default());
    let pipeline = ClipPipeline::new(harness.config.clone(), acquirer.clone(), None);
    let catalog = Arc::new(MemoryCatalog::new());

    let first = pipeline
        .process_with_catalog(URL, &harness.options(), catalog.as_ref())
        .await
        .unwrap();
    assert!(first.is_new);
    ClipPublisher::new(catalog.clone())
        .publish(&first.metadata, &first.clips)
        .await
        .unwrap();

    let second = pipeline
        .process_with_catalog(
            "https://youtu.be/abcdefghijk",
            &harness.options(),
            catalog.as_ref(),
        )
        .await
        .unwrap();

    assert!(!second.is_new);
    assert_eq!(acquirer.calls.load(Ordering::SeqCst), 1);
    assert_eq!(second.metadata.title.as_deref(), Some("Synthetic"));
    assert_eq!(second.clips.len(), first.clips.len());
    assert_eq!(second.clips[0].clip_name, first.clips[0].clip_name);
    assert_eq!(second.clips[0].clip_path, first.clips[0].clip_path);
    assert!(catalog
        .exists(&SourceId::from("abcdefghijk"))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_acquisition_failure_cleans_up() {
    let harness = Harness::new();
    let pipeline = ClipPipeline::new(harness.config.clone(), Arc::new(PrivateSource), None);

    let err = pipeline
        .process(URL, &harness.options())
        .await
        .unwrap_err();

    assert!(err.is_client_error());
    assert!(harness.work_dir_is_empty());
    assert!(!harness.config.source_dir("abcdefghijk").exists());
}

#[tokio::test]
async fn test_bad_url_never_reaches_acquirer() {
    let harness = Harness::new();
    let acquirer = Arc::new(SyntheticAcquirer::default());
    let pipeline = ClipPipeline::new(harness.config.clone(), acquirer.clone(), None);

    let err = pipeline
        .process("https://example.com/video", &harness.options())
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::Media(_)));
    assert_eq!(acquirer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_invalid_options_rejected() {
    let harness = Harness::new();
    let pipeline = ClipPipeline::new(
        harness.config.clone(),
        Arc::new(SyntheticAcquirer::default()),
        None,
    );

    let err = pipeline
        .process(URL, &harness.options().with_aggressiveness(7))
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::InvalidRequest(_)));
}

#[tokio::test]
async fn test_unusable_config_rejected_before_acquisition() {
    let harness = Harness::new();
    let mut config = harness.config.clone();
    config.enhance_chunk_secs = 0.0;
    let acquirer = Arc::new(SyntheticAcquirer::default());
    let pipeline = ClipPipeline::new(config, acquirer.clone(), None);

    let err = pipeline
        .process(URL, &harness.options())
        .await
        .unwrap_err();

    assert!(matches!(err, WorkerError::ConfigError(_)));
    assert_eq!(acquirer.calls.load(Ordering::SeqCst), 0);
}
