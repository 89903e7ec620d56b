//! In-memory mono PCM waveform and WAV file I/O.

use std::path::Path;

use hound::{SampleFormat, WavSpec};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Bytes per 16-bit PCM sample.
pub const BYTES_PER_SAMPLE: usize = 2;

/// Mono signed 16-bit PCM tagged with its sample rate.
///
/// Stages take a `Waveform` by value and hand back a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    samples: Vec<i16>,
    sample_rate: u32,
}

impl Waveform {
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Build from normalized `[-1.0, 1.0]` floats, clamping out-of-range values.
    pub fn from_f32(samples: &[f32], sample_rate: u32) -> Self {
        Self::new(samples.iter().map(|&s| f32_to_i16(s)).collect(), sample_rate)
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<i16> {
        self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Samples as normalized floats.
    pub fn to_f32(&self) -> Vec<f32> {
        self.samples.iter().map(|&s| i16_to_f32(s)).collect()
    }

    /// Read a mono 16-bit integer WAV file.
    ///
    /// Anything else is a format error: the normalizer is expected to have
    /// produced exactly this layout.
    pub fn read_wav(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();

        if spec.channels != 1 {
            return Err(MediaError::invalid_format(format!(
                "expected mono audio, got {} channels in {}",
                spec.channels,
                path.display()
            )));
        }
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            return Err(MediaError::invalid_format(format!(
                "expected 16-bit integer PCM, got {}-bit {:?} in {}",
                spec.bits_per_sample,
                spec.sample_format,
                path.display()
            )));
        }

        let samples = reader
            .samples::<i16>()
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            path = %path.display(),
            samples = samples.len(),
            sample_rate = spec.sample_rate,
            "Loaded waveform"
        );

        Ok(Self::new(samples, spec.sample_rate))
    }

    /// Write as a mono 16-bit WAV file.
    pub fn write_wav(&self, path: impl AsRef<Path>) -> MediaResult<()> {
        write_pcm_wav(path, &self.samples, self.sample_rate)
    }
}

/// WAV spec for mono 16-bit PCM at `sample_rate`.
pub fn pcm_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

/// Write raw samples as a mono 16-bit WAV file.
pub fn write_pcm_wav(path: impl AsRef<Path>, samples: &[i16], sample_rate: u32) -> MediaResult<()> {
    let mut writer = hound::WavWriter::create(path, pcm_spec(sample_rate))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

fn i16_to_f32(sample: i16) -> f32 {
    sample as f32 / 32768.0
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}
