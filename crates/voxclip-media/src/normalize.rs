//! Format normalization: any container/codec to mono 16-bit PCM WAV.

use std::path::Path;

use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Working sample rate of the normalized waveform.
pub const INTERMEDIATE_SAMPLE_RATE: u32 = 48_000;

/// Transcode `input` into a mono `pcm_s16le` WAV at `sample_rate`.
pub async fn transcode_to_pcm(
    input: &Path,
    output: &Path,
    sample_rate: u32,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    debug!(
        input = %input.display(),
        output = %output.display(),
        sample_rate,
        "Normalizing audio"
    );

    let cmd = FfmpegCommand::new(input, output)
        .no_video()
        .audio_channels(1)
        .sample_rate(sample_rate)
        .audio_codec("pcm_s16le");

    runner.run(&cmd).await?;

    let metadata = tokio::fs::metadata(output).await.map_err(|_| {
        MediaError::ffmpeg_failed(
            format!("FFmpeg produced no output at {}", output.display()),
            None,
            None,
        )
    })?;
    if metadata.len() == 0 {
        return Err(MediaError::invalid_format(format!(
            "normalized file {} is empty",
            output.display()
        )));
    }

    info!(
        output = %output.display(),
        size_kb = metadata.len() / 1024,
        "Normalized audio to mono PCM"
    );

    Ok(())
}
