//! Band-limited sample-rate conversion.

use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use tracing::debug;

use crate::error::{MediaError, MediaResult};
use crate::waveform::Waveform;

/// Target rate for voice activity detection.
pub const TARGET_SAMPLE_RATE: u32 = 16_000;

/// Input frames fed to the resampler per call.
const BLOCK_FRAMES: usize = 8192;

/// Resample `waveform` to `target_rate`.
///
/// Output length is `round(len * target_rate / source_rate)`, mono, 16-bit.
/// Returns the input unchanged when the rates already match.
pub fn resample(waveform: Waveform, target_rate: u32) -> MediaResult<Waveform> {
    let source_rate = waveform.sample_rate();
    if source_rate == 0 || target_rate == 0 {
        return Err(MediaError::UnsupportedFormat(format!(
            "cannot resample {} Hz to {} Hz",
            source_rate, target_rate
        )));
    }
    if source_rate == target_rate {
        return Ok(waveform);
    }
    if waveform.is_empty() {
        return Ok(Waveform::new(Vec::new(), target_rate));
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let input = waveform.to_f32();
    let expected = (input.len() as f64 * ratio).round() as usize;

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, params, BLOCK_FRAMES, 1)
        .map_err(|e| MediaError::UnsupportedFormat(format!("resampler setup: {e}")))?;
    let delay = resampler.output_delay();

    let mut output: Vec<f32> = Vec::with_capacity(expected + delay);
    let mut blocks = input.chunks_exact(BLOCK_FRAMES);

    for block in blocks.by_ref() {
        let out = resampler
            .process(&[block], None)
            .map_err(|e| MediaError::UnsupportedFormat(format!("resample: {e}")))?;
        output.extend_from_slice(&out[0]);
    }

    let tail = blocks.remainder();
    if !tail.is_empty() {
        let out = resampler
            .process_partial(Some(&[tail]), None)
            .map_err(|e| MediaError::UnsupportedFormat(format!("resample: {e}")))?;
        output.extend_from_slice(&out[0]);
    }

    // Drain the filter until the delayed samples are out.
    while output.len() < expected + delay {
        let out = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| MediaError::UnsupportedFormat(format!("resample: {e}")))?;
        if out[0].is_empty() {
            break;
        }
        output.extend_from_slice(&out[0]);
    }

    let skip = delay.min(output.len());
    output.drain(..skip);
    output.resize(expected, 0.0);

    debug!(
        from = source_rate,
        to = target_rate,
        in_samples = input.len(),
        out_samples = output.len(),
        "Resampled waveform"
    );

    Ok(Waveform::from_f32(&output, target_rate))
}
