//! Neural speech enhancement (noise suppression).
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Waveform     │───►│ Chunker      │───►│ Enhancer     │
//! │ (48kHz mono) │    │ (600s slices)│    │ (ONNX model) │
//! └──────────────┘    └──────────────┘    └──────────────┘
//!                            │                   │ Err
//!                            ▼                   ▼
//!                     ┌──────────────┐    ┌──────────────┐
//!                     │ Concatenate  │◄───│ Original     │
//!                     │ (in order)   │    │ chunk        │
//!                     └──────────────┘    └──────────────┘
//! ```
//!
//! The model is held by an [`EnhancerHandle`], loaded on first use and
//! reused for the life of the process. The handle serializes access.

mod engine;
mod handle;
mod onnx;

pub use engine::{enhance_chunked, EnhancementConfig, EnhancementReport};
pub use handle::EnhancerHandle;
pub use onnx::OnnxEnhancer;

use crate::error::MediaResult;

/// A waveform-in, waveform-out speech enhancement model.
pub trait SpeechEnhancer: Send {
    /// Sample rate the model expects.
    fn sample_rate(&self) -> u32;

    /// Enhance one chunk of normalized `[-1.0, 1.0]` samples.
    fn enhance(&mut self, chunk: &[f32]) -> MediaResult<Vec<f32>>;
}
