//! Cut voiced segments into padded WAV clips.
//!
//! Each accepted segment becomes `<output_dir>/<source_id>/<source_id>-NNN.wav`:
//! the exact `[start, end)` window of the working waveform with zero-valued
//! silence before and after. Segments outside the duration policy are
//! skipped without touching disk and do not consume a counter value.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use voxclip_models::{clip_name, Clip, DurationPolicy, VoiceSegment};

use crate::error::{MediaError, MediaResult};
use crate::waveform::{write_pcm_wav, Waveform};

/// Largest padding accepted on either side (seconds).
pub const MAX_PADDING_SECS: f64 = 5.0;

/// Padding and duration bounds for clip extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipConfig {
    /// Silence prepended to each clip (seconds).
    pub start_padding: f64,
    /// Silence appended to each clip (seconds).
    pub end_padding: f64,
    pub policy: DurationPolicy,
}

impl Default for ClipConfig {
    fn default() -> Self {
        Self {
            start_padding: 1.0,
            end_padding: 0.5,
            policy: DurationPolicy::default(),
        }
    }
}

impl ClipConfig {
    pub fn with_padding(mut self, start: f64, end: f64) -> Self {
        self.start_padding = start;
        self.end_padding = end;
        self
    }

    pub fn with_policy(mut self, policy: DurationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn validate(&self) -> MediaResult<()> {
        for (name, value) in [("start_padding", self.start_padding), ("end_padding", self.end_padding)] {
            if !(0.0..=MAX_PADDING_SECS).contains(&value) {
                return Err(MediaError::invalid_config(format!(
                    "{} must be within 0..={} seconds, got {}",
                    name, MAX_PADDING_SECS, value
                )));
            }
        }
        if self.policy.min_secs < 0.0 || self.policy.min_secs > self.policy.max_secs {
            return Err(MediaError::invalid_config(format!(
                "invalid clip duration bounds [{}, {}]",
                self.policy.min_secs, self.policy.max_secs
            )));
        }
        Ok(())
    }
}

/// Writes accepted clips for one source.
pub struct ClipExtractor<'a> {
    source_id: &'a str,
    waveform: &'a Waveform,
    config: &'a ClipConfig,
    source_dir: PathBuf,
}

impl<'a> ClipExtractor<'a> {
    pub fn new(
        source_id: &'a str,
        waveform: &'a Waveform,
        config: &'a ClipConfig,
        output_dir: impl AsRef<Path>,
    ) -> Self {
        Self {
            source_id,
            waveform,
            config,
            source_dir: output_dir.as_ref().join(source_id),
        }
    }

    /// Directory holding this source's clips.
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Padded samples for `segment`.
    pub fn padded_samples(&self, segment: &VoiceSegment) -> Vec<i16> {
        let rate = self.waveform.sample_rate() as f64;
        let pcm = self.waveform.samples();

        let start = ((segment.start * rate) as usize).min(pcm.len());
        let len = (segment.duration() * rate) as usize;
        let end = start.saturating_add(len).min(pcm.len());
        let lead = (self.config.start_padding * rate) as usize;
        let trail = (self.config.end_padding * rate) as usize;

        let mut out = Vec::with_capacity(lead + (end - start) + trail);
        out.resize(lead, 0);
        out.extend_from_slice(&pcm[start..end]);
        out.resize(out.len() + trail, 0);
        out
    }

    /// Filter, name, and write clips in segment order.
    pub fn extract(&self, segments: &[VoiceSegment]) -> MediaResult<Vec<Clip>> {
        self.config.validate()?;

        let mut clips = Vec::new();
        let mut counter = 0usize;
        let mut rejected = 0usize;

        for segment in segments {
            let duration = segment.duration();
            if !self.config.policy.accepts(duration) {
                rejected += 1;
                metrics::counter!("voxclip_clips_rejected_total").increment(1);
                debug!(
                    start = segment.start,
                    end = segment.end,
                    duration,
                    "Segment outside duration bounds, skipping"
                );
                continue;
            }

            if counter == 0 {
                std::fs::create_dir_all(&self.source_dir)?;
            }
            counter += 1;

            let clip = Clip::from_segment(
                clip_name(self.source_id, counter),
                segment,
                self.config.start_padding,
                self.config.end_padding,
            );
            let path = self.source_dir.join(clip.file_name());
            write_pcm_wav(&path, &self.padded_samples(segment), self.waveform.sample_rate())?;
            metrics::counter!("voxclip_clips_accepted_total").increment(1);

            clips.push(clip.with_path(path));
        }

        info!(
            source_id = self.source_id,
            accepted = clips.len(),
            rejected,
            "Extracted clips"
        );

        Ok(clips)
    }
}
