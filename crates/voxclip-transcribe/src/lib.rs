//! Speech-to-text for published clips.

pub mod error;
pub mod google;

use std::path::Path;

use async_trait::async_trait;

pub use error::{TranscribeError, TranscribeResult};
pub use google::{GoogleSpeechClient, SpeechConfig};

/// Turns a clip file into text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// `Ok(None)` when the service heard nothing it could transcribe.
    async fn transcribe(&self, local_path: &Path) -> TranscribeResult<Option<String>>;
}
