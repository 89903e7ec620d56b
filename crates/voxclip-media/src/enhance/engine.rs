//! Chunked enhancement with per-chunk fallback.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::SpeechEnhancer;
use crate::error::{MediaError, MediaResult};
use crate::waveform::Waveform;

/// Default chunk length in seconds.
pub const DEFAULT_CHUNK_SECS: f64 = 600.0;

/// Configuration for chunked enhancement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementConfig {
    /// Length of each inference chunk in seconds.
    ///
    /// Peak memory during inference is proportional to this, not to the
    /// length of the source.
    pub chunk_secs: f64,
}

impl Default for EnhancementConfig {
    fn default() -> Self {
        Self {
            chunk_secs: DEFAULT_CHUNK_SECS,
        }
    }
}

impl EnhancementConfig {
    /// Builder-style setter for chunk length.
    pub fn with_chunk_secs(mut self, secs: f64) -> Self {
        self.chunk_secs = secs;
        self
    }

    /// Reject chunk lengths that are not a positive, finite number of seconds.
    pub fn validate(&self) -> MediaResult<()> {
        if !(self.chunk_secs.is_finite() && self.chunk_secs > 0.0) {
            return Err(MediaError::invalid_config(format!(
                "enhancement chunk length must be a positive number of seconds, got {}",
                self.chunk_secs
            )));
        }
        Ok(())
    }

    /// Chunk length in samples at `sample_rate`, never zero.
    pub fn chunk_samples(&self, sample_rate: u32) -> usize {
        ((self.chunk_secs * sample_rate as f64) as usize).max(1)
    }
}

/// What happened during one enhancement pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnhancementReport {
    pub chunks: usize,
    pub failed_chunks: usize,
}

impl EnhancementReport {
    /// True when every chunk fell back to the original audio.
    pub fn fully_degraded(&self) -> bool {
        self.chunks > 0 && self.failed_chunks == self.chunks
    }
}

/// Enhance `waveform` chunk by chunk.
///
/// A chunk whose inference fails is replaced by the original samples for
/// that window. The output always has the same sample count and rate as
/// the input, and chunk `i` of the output comes from chunk `i` of the input.
///
/// Only an invalid chunk length or a sample-rate mismatch between the
/// waveform and the model is an error.
pub fn enhance_chunked(
    enhancer: &mut dyn SpeechEnhancer,
    waveform: Waveform,
    config: &EnhancementConfig,
) -> MediaResult<(Waveform, EnhancementReport)> {
    config.validate()?;
    let sample_rate = waveform.sample_rate();
    if sample_rate != enhancer.sample_rate() {
        return Err(MediaError::UnsupportedFormat(format!(
            "enhancement model expects {} Hz, waveform is {} Hz",
            enhancer.sample_rate(),
            sample_rate
        )));
    }

    let chunk_len = config.chunk_samples(sample_rate);
    let input = waveform.into_samples();
    let total_chunks = input.len().div_ceil(chunk_len);
    let mut output = Vec::with_capacity(input.len());
    let mut report = EnhancementReport {
        chunks: total_chunks,
        failed_chunks: 0,
    };

    info!(
        samples = input.len(),
        chunk_samples = chunk_len,
        chunks = total_chunks,
        "Starting chunked enhancement"
    );

    for (index, chunk) in input.chunks(chunk_len).enumerate() {
        metrics::counter!("voxclip_enhance_chunks_total").increment(1);

        match enhance_chunk(enhancer, chunk) {
            Ok(enhanced) => {
                debug!(chunk = index + 1, of = total_chunks, "Enhanced chunk");
                output.extend(enhanced);
            }
            Err(e) => {
                error!(
                    chunk = index + 1,
                    of = total_chunks,
                    "Enhancement failed, keeping original audio: {}",
                    e
                );
                metrics::counter!("voxclip_enhance_chunk_failures_total").increment(1);
                report.failed_chunks += 1;
                output.extend_from_slice(chunk);
            }
        }
    }

    if report.failed_chunks > 0 {
        warn!(
            failed = report.failed_chunks,
            of = report.chunks,
            "Some chunks were not enhanced"
        );
    }

    Ok((Waveform::new(output, sample_rate), report))
}

/// Run one chunk through the model and fit the result to the chunk length.
fn enhance_chunk(enhancer: &mut dyn SpeechEnhancer, chunk: &[i16]) -> MediaResult<Vec<i16>> {
    let input: Vec<f32> = chunk.iter().map(|&s| s as f32 / 32768.0).collect();
    let mut enhanced = enhancer.enhance(&input)?;

    if enhanced.iter().any(|s| !s.is_finite()) {
        return Err(MediaError::enhancement("model produced non-finite samples"));
    }

    if enhanced.len() != chunk.len() {
        debug!(
            expected = chunk.len(),
            got = enhanced.len(),
            "Fitting enhanced chunk to input length"
        );
        enhanced.resize(chunk.len(), 0.0);
    }

    Ok(enhanced
        .into_iter()
        .map(|s| (s.clamp(-1.0, 1.0) * 32767.0).round() as i16)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Halves every sample.
    struct Halver {
        rate: u32,
        calls: usize,
    }

    impl SpeechEnhancer for Halver {
        fn sample_rate(&self) -> u32 {
            self.rate
        }

        fn enhance(&mut self, chunk: &[f32]) -> MediaResult<Vec<f32>> {
            self.calls += 1;
            Ok(chunk.iter().map(|s| s * 0.5).collect())
        }
    }

    /// Fails on the chunk indices listed in `fail_on`.
    struct Flaky {
        fail_on: Vec<usize>,
        call: usize,
    }

    impl SpeechEnhancer for Flaky {
        fn sample_rate(&self) -> u32 {
            100
        }

        fn enhance(&mut self, chunk: &[f32]) -> MediaResult<Vec<f32>> {
            let index = self.call;
            self.call += 1;
            if self.fail_on.contains(&index) {
                Err(MediaError::enhancement("inference exploded"))
            } else {
                Ok(vec![0.0; chunk.len()])
            }
        }
    }

    /// Returns a shorter buffer than it was given.
    struct Truncating;

    impl SpeechEnhancer for Truncating {
        fn sample_rate(&self) -> u32 {
            100
        }

        fn enhance(&mut self, chunk: &[f32]) -> MediaResult<Vec<f32>> {
            Ok(chunk[..chunk.len() / 2].to_vec())
        }
    }

    fn ramp(len: usize, rate: u32) -> Waveform {
        Waveform::new((0..len).map(|i| (i % 1000) as i16 * 10 + 1).collect(), rate)
    }

    #[test]
    fn test_chunk_count_and_order() {
        let mut enhancer = Halver { rate: 100, calls: 0 };
        let config = EnhancementConfig::default().with_chunk_secs(1.0);
        let input = ramp(250, 100);

        let (out, report) = enhance_chunked(&mut enhancer, input.clone(), &config).unwrap();

        assert_eq!(enhancer.calls, 3);
        assert_eq!(report.chunks, 3);
        assert_eq!(report.failed_chunks, 0);
        assert_eq!(out.len(), input.len());
        // Halving preserves order: every output sample is about half its input.
        for (a, b) in input.samples().iter().zip(out.samples()) {
            assert!((*a as i32 / 2 - *b as i32).abs() <= 1);
        }
    }

    #[test]
    fn test_all_chunks_fail_returns_original() {
        let mut enhancer = Flaky {
            fail_on: vec![0, 1, 2, 3],
            call: 0,
        };
        let config = EnhancementConfig::default().with_chunk_secs(1.0);
        let input = ramp(333, 100);

        let (out, report) = enhance_chunked(&mut enhancer, input.clone(), &config).unwrap();

        assert_eq!(out, input);
        assert_eq!(report.chunks, 4);
        assert!(report.fully_degraded());
    }

    #[test]
    fn test_failed_chunk_keeps_its_window() {
        let mut enhancer = Flaky {
            fail_on: vec![1],
            call: 0,
        };
        let config = EnhancementConfig::default().with_chunk_secs(1.0);
        let input = ramp(300, 100);

        let (out, report) = enhance_chunked(&mut enhancer, input.clone(), &config).unwrap();

        assert_eq!(report.failed_chunks, 1);
        assert!(out.samples()[..100].iter().all(|&s| s == 0));
        assert_eq!(&out.samples()[100..200], &input.samples()[100..200]);
        assert!(out.samples()[200..].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_short_model_output_is_padded() {
        let config = EnhancementConfig::default().with_chunk_secs(1.0);
        let (out, report) = enhance_chunked(&mut Truncating, ramp(150, 100), &config).unwrap();

        assert_eq!(out.len(), 150);
        assert_eq!(report.failed_chunks, 0);
    }

    #[test]
    fn test_empty_waveform() {
        let mut enhancer = Halver { rate: 100, calls: 0 };
        let (out, report) = enhance_chunked(
            &mut enhancer,
            Waveform::new(Vec::new(), 100),
            &EnhancementConfig::default(),
        )
        .unwrap();

        assert!(out.is_empty());
        assert_eq!(report.chunks, 0);
        assert_eq!(enhancer.calls, 0);
    }

    #[test]
    fn test_rate_mismatch_is_rejected() {
        let mut enhancer = Halver { rate: 48000, calls: 0 };
        let err = enhance_chunked(
            &mut enhancer,
            ramp(10, 16000),
            &EnhancementConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, MediaError::UnsupportedFormat(_)));
    }

    #[test]
    fn test_non_positive_chunk_length_is_rejected() {
        for secs in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = EnhancementConfig::default().with_chunk_secs(secs);
            assert!(matches!(config.validate(), Err(MediaError::InvalidConfig(_))));

            let mut enhancer = Halver { rate: 16000, calls: 0 };
            let err = enhance_chunked(&mut enhancer, ramp(10, 16000), &config).unwrap_err();
            assert!(matches!(err, MediaError::InvalidConfig(_)));
            assert_eq!(enhancer.calls, 0);
        }
    }
}
