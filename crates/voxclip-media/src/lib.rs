#![deny(unreachable_patterns)]
//! Audio acquisition, enhancement and voice segmentation.
//!
//! This crate provides:
//! - yt-dlp metadata and audio acquisition with classified failures
//! - FFmpeg transcoding to mono 16-bit PCM
//! - Chunked ONNX speech enhancement with per-chunk fallback
//! - Band-limited resampling
//! - Frame-level VAD with a hangover state machine
//! - Padded WAV clip extraction gated by a duration policy

pub mod acquire;
pub mod clip;
pub mod command;
pub mod download;
pub mod enhance;
pub mod error;
pub mod normalize;
pub mod resample;
pub mod vad;
pub mod waveform;

pub use acquire::{Acquisition, SourceAcquirer, YtDlpAcquirer};
pub use clip::{ClipConfig, ClipExtractor, MAX_PADDING_SECS};
pub use command::{check_dependencies, FfmpegCommand, FfmpegRunner};
pub use enhance::{
    enhance_chunked, EnhancementConfig, EnhancementReport, EnhancerHandle, OnnxEnhancer,
    SpeechEnhancer,
};
pub use error::{AcquisitionKind, ErrorKind, MediaError, MediaResult};
pub use normalize::{transcode_to_pcm, INTERMEDIATE_SAMPLE_RATE};
pub use resample::{resample, TARGET_SAMPLE_RATE};
pub use vad::{
    detect_voice, segment_voice, EnergyClassifier, FrameClassifier, Frames, VadConfig,
    WebRtcClassifier,
};
pub use waveform::{write_pcm_wav, Waveform};
