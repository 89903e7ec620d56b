//! Fixed-duration framing of PCM buffers.

use crate::waveform::BYTES_PER_SAMPLE;

/// A fixed-size window of PCM samples with its position in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame<'a> {
    pub samples: &'a [i16],
    /// Start time in seconds.
    pub timestamp: f64,
    /// Duration in seconds.
    pub duration: f64,
}

impl Frame<'_> {
    pub fn byte_len(&self) -> usize {
        self.samples.len() * BYTES_PER_SAMPLE
    }

    pub fn end(&self) -> f64 {
        self.timestamp + self.duration
    }
}

/// Size in bytes of one frame: `rate * ms / 1000 * bytes_per_sample`.
pub fn frame_byte_size(sample_rate: u32, frame_ms: u32) -> usize {
    frame_samples(sample_rate, frame_ms) * BYTES_PER_SAMPLE
}

/// Number of samples in one frame.
pub fn frame_samples(sample_rate: u32, frame_ms: u32) -> usize {
    (sample_rate as u64 * frame_ms as u64 / 1000) as usize
}

/// A restartable view of a PCM buffer as consecutive frames.
///
/// Each call to [`Frames::iter`] starts again from the beginning. A
/// trailing partial frame is never produced.
#[derive(Debug, Clone, Copy)]
pub struct Frames<'a> {
    pcm: &'a [i16],
    sample_rate: u32,
    frame_len: usize,
}

impl<'a> Frames<'a> {
    pub fn new(pcm: &'a [i16], sample_rate: u32, frame_ms: u32) -> Self {
        Self {
            pcm,
            sample_rate,
            frame_len: frame_samples(sample_rate, frame_ms),
        }
    }

    /// Number of frames the sequence yields.
    pub fn len(&self) -> usize {
        if self.frame_len == 0 {
            return 0;
        }
        self.pcm.len() / self.frame_len
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> FrameIter<'a> {
        FrameIter {
            pcm: self.pcm,
            frame_len: self.frame_len,
            duration: self.frame_len as f64 / self.sample_rate.max(1) as f64,
            sample_rate: self.sample_rate.max(1),
            index: 0,
        }
    }
}

impl<'a> IntoIterator for &Frames<'a> {
    type Item = Frame<'a>;
    type IntoIter = FrameIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy iterator over [`Frames`].
#[derive(Debug, Clone)]
pub struct FrameIter<'a> {
    pcm: &'a [i16],
    frame_len: usize,
    duration: f64,
    sample_rate: u32,
    index: usize,
}

impl<'a> Iterator for FrameIter<'a> {
    type Item = Frame<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.frame_len == 0 {
            return None;
        }
        let start = self.index * self.frame_len;
        let end = start + self.frame_len;
        if end > self.pcm.len() {
            return None;
        }
        self.index += 1;

        Some(Frame {
            samples: &self.pcm[start..end],
            // From the sample offset, so timestamps do not drift.
            timestamp: start as f64 / self.sample_rate as f64,
            duration: self.duration,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.frame_len == 0 {
            0
        } else {
            (self.pcm.len() / self.frame_len).saturating_sub(self.index)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for FrameIter<'_> {}
