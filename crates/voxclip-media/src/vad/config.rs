//! Configuration for voice segmentation.

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaResult};

/// Frame durations the WebRTC classifier accepts.
pub const SUPPORTED_FRAME_MS: &[u32] = &[10, 20, 30];

/// Configuration for frame classification and the hangover window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VadConfig {
    /// Frame duration in milliseconds (10, 20 or 30).
    pub frame_ms: u32,

    /// Length of the hangover window in milliseconds.
    ///
    /// The ring buffer holds `padding_window_ms / frame_ms` classifications.
    pub padding_window_ms: u32,

    /// Fraction of the window that must agree before a transition.
    ///
    /// A transition fires when strictly more than `ratio * capacity`
    /// buffered frames are speech (to trigger) or non-speech (to release).
    pub trigger_ratio: f64,

    /// Classifier sensitivity, 0 (least aggressive) to 3 (most).
    pub aggressiveness: u8,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            frame_ms: 30,
            padding_window_ms: 300,
            trigger_ratio: 0.9,
            aggressiveness: 2,
        }
    }
}

impl VadConfig {
    /// Builder-style setter for frame duration.
    pub fn with_frame_ms(mut self, ms: u32) -> Self {
        self.frame_ms = ms;
        self
    }

    /// Builder-style setter for the hangover window.
    pub fn with_padding_window_ms(mut self, ms: u32) -> Self {
        self.padding_window_ms = ms;
        self
    }

    /// Builder-style setter for the transition ratio.
    pub fn with_trigger_ratio(mut self, ratio: f64) -> Self {
        self.trigger_ratio = ratio;
        self
    }

    /// Builder-style setter for aggressiveness, clamped to 0..=3.
    pub fn with_aggressiveness(mut self, level: u8) -> Self {
        self.aggressiveness = level.min(3);
        self
    }

    /// Number of frames in the hangover window.
    pub fn window_frames(&self) -> usize {
        if self.frame_ms == 0 {
            return 0;
        }
        (self.padding_window_ms / self.frame_ms) as usize
    }

    /// Reject configurations the segmenter cannot run with.
    pub fn validate(&self) -> MediaResult<()> {
        if !SUPPORTED_FRAME_MS.contains(&self.frame_ms) {
            return Err(MediaError::vad(format!(
                "frame duration must be one of {:?} ms, got {}",
                SUPPORTED_FRAME_MS, self.frame_ms
            )));
        }
        if self.window_frames() == 0 {
            return Err(MediaError::vad(format!(
                "padding window {} ms is shorter than one {} ms frame",
                self.padding_window_ms, self.frame_ms
            )));
        }
        if !(self.trigger_ratio > 0.0 && self.trigger_ratio < 1.0) {
            return Err(MediaError::vad(format!(
                "trigger ratio must be in (0, 1), got {}",
                self.trigger_ratio
            )));
        }
        if self.aggressiveness > 3 {
            return Err(MediaError::vad(format!(
                "aggressiveness must be 0..=3, got {}",
                self.aggressiveness
            )));
        }
        Ok(())
    }
}
