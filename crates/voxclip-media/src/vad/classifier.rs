//! Per-frame speech/non-speech classifiers.

use tracing::debug;
use webrtc_vad::{SampleRate, Vad, VadMode};

use super::frames::Frame;
use crate::error::{MediaError, MediaResult};

/// Decides whether a single frame contains speech.
pub trait FrameClassifier {
    fn is_speech(&mut self, frame: &Frame<'_>) -> MediaResult<bool>;
}

/// WebRTC GMM voice activity detector.
///
/// Not `Send`: build it on the thread that runs the segmentation.
pub struct WebRtcClassifier {
    vad: Vad,
}

impl WebRtcClassifier {
    /// Create a classifier for `sample_rate` with aggressiveness 0..=3.
    pub fn new(sample_rate: u32, aggressiveness: u8) -> MediaResult<Self> {
        let rate = match sample_rate {
            8000 => SampleRate::Rate8kHz,
            16000 => SampleRate::Rate16kHz,
            32000 => SampleRate::Rate32kHz,
            48000 => SampleRate::Rate48kHz,
            other => {
                return Err(MediaError::UnsupportedFormat(format!(
                    "WebRTC VAD supports 8, 16, 32 or 48 kHz, got {} Hz",
                    other
                )))
            }
        };

        let mode = match aggressiveness {
            0 => VadMode::Quality,
            1 => VadMode::LowBitrate,
            2 => VadMode::Aggressive,
            _ => VadMode::VeryAggressive,
        };

        debug!(sample_rate, aggressiveness, "Initialized WebRTC VAD");

        Ok(Self {
            vad: Vad::new_with_rate_and_mode(rate, mode),
        })
    }
}

impl FrameClassifier for WebRtcClassifier {
    fn is_speech(&mut self, frame: &Frame<'_>) -> MediaResult<bool> {
        self.vad.is_voice_segment(frame.samples).map_err(|_| {
            MediaError::vad(format!(
                "WebRTC VAD rejected a frame of {} samples",
                frame.samples.len()
            ))
        })
    }
}

/// RMS energy threshold classifier.
///
/// Works at any sample rate and frame size; useful for clean synthetic
/// input and as a fallback where WebRTC is not applicable.
#[derive(Debug, Clone)]
pub struct EnergyClassifier {
    /// Normalized RMS at or above which a frame counts as speech.
    threshold: f32,
}

impl Default for EnergyClassifier {
    fn default() -> Self {
        Self { threshold: 0.02 }
    }
}

impl EnergyClassifier {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold: threshold.clamp(0.0, 1.0),
        }
    }

    /// Threshold derived from aggressiveness 0..=3.
    pub fn from_aggressiveness(level: u8) -> Self {
        let threshold = match level {
            0 => 0.01,
            1 => 0.015,
            2 => 0.02,
            _ => 0.04,
        };
        Self::new(threshold)
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }
}

impl FrameClassifier for EnergyClassifier {
    fn is_speech(&mut self, frame: &Frame<'_>) -> MediaResult<bool> {
        Ok(calculate_rms(frame.samples) >= self.threshold)
    }
}

/// Root mean square of the samples, normalized to `[0.0, 1.0]`.
pub fn calculate_rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f64 = samples
        .iter()
        .map(|&sample| {
            let normalized = sample as f64 / i16::MAX as f64;
            normalized * normalized
        })
        .sum();

    (sum_squares / samples.len() as f64).sqrt() as f32
}
