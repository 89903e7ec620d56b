//! Voiced time segments.

use serde::{Deserialize, Serialize};

/// A voiced region of a waveform, in elapsed seconds from its start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSegment {
    pub start: f64,
    pub end: f64,
}

impl VoiceSegment {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Raw duration in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}
