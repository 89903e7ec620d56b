//! Clip records and the duration policy that gates them.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::segment::VoiceSegment;
use crate::utils::round2;

/// Default minimum accepted clip duration (seconds).
pub const DEFAULT_MIN_CLIP_DURATION: f64 = 4.0;

/// Default maximum accepted clip duration (seconds).
pub const DEFAULT_MAX_CLIP_DURATION: f64 = 10.0;

/// Inclusive duration bounds for accepted clips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationPolicy {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for DurationPolicy {
    fn default() -> Self {
        Self {
            min_secs: DEFAULT_MIN_CLIP_DURATION,
            max_secs: DEFAULT_MAX_CLIP_DURATION,
        }
    }
}

impl DurationPolicy {
    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    /// Whether a raw duration falls within `[min, max]`.
    pub fn accepts(&self, duration_secs: f64) -> bool {
        duration_secs >= self.min_secs && duration_secs <= self.max_secs
    }
}

/// Deterministic clip name: `<source_id>-<counter:03>`.
pub fn clip_name(source_id: &str, counter: usize) -> String {
    format!("{}-{:03}", source_id, counter)
}

/// One accepted clip cut from a voiced segment.
///
/// Times are elapsed seconds into the source. Durations are rounded to
/// two decimals; `start_time`/`end_time` keep full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// Clip name without extension.
    pub clip_name: String,
    pub start_time: f64,
    pub end_time: f64,
    /// Raw duration (`end - start`), rounded.
    pub duration: f64,
    /// Raw duration plus both paddings, rounded.
    pub padded_duration: f64,
    /// Where the padded WAV was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clip_path: Option<PathBuf>,
}

impl Clip {
    /// Build the record for `segment` with the given paddings.
    pub fn from_segment(
        clip_name: String,
        segment: &VoiceSegment,
        start_padding: f64,
        end_padding: f64,
    ) -> Self {
        let raw = segment.duration();
        Self {
            clip_name,
            start_time: segment.start,
            end_time: segment.end,
            duration: round2(raw),
            padded_duration: round2(raw + start_padding + end_padding),
            clip_path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.clip_path = Some(path.into());
        self
    }

    /// File name of the clip on disk.
    pub fn file_name(&self) -> String {
        format!("{}.wav", self.clip_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_name_zero_padded() {
        assert_eq!(clip_name("abcdefghijk", 1), "abcdefghijk-001");
        assert_eq!(clip_name("abcdefghijk", 42), "abcdefghijk-042");
        assert_eq!(clip_name("abcdefghijk", 1234), "abcdefghijk-1234");
    }

    #[test]
    fn test_duration_policy_bounds_are_inclusive() {
        let policy = DurationPolicy::default();
        assert!(policy.accepts(4.0));
        assert!(policy.accepts(10.0));
        assert!(policy.accepts(7.3));
        assert!(!policy.accepts(3.5));
        assert!(!policy.accepts(10.01));
    }

    #[test]
    fn test_clip_from_segment_rounds_durations() {
        let segment = VoiceSegment::new(1.2, 6.713);
        let clip = Clip::from_segment("abcdefghijk-001".into(), &segment, 1.0, 0.5);

        assert_eq!(clip.duration, 5.51);
        assert_eq!(clip.padded_duration, 7.01);
        assert_eq!(clip.padded_duration, round2(segment.duration() + 1.5));
        assert_eq!(clip.start_time, 1.2);
        assert_eq!(clip.file_name(), "abcdefghijk-001.wav");
    }
}
