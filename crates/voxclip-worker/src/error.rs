//! Worker error types.

use thiserror::Error;

use crate::catalog::CatalogError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Media error: {0}")]
    Media(#[from] voxclip_media::MediaError),

    #[error("Storage error: {0}")]
    Storage(#[from] voxclip_storage::StorageError),

    #[error("Transcription error: {0}")]
    Transcribe(#[from] voxclip_transcribe::TranscribeError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<voxclip_models::SourceIdError> for WorkerError {
    fn from(e: voxclip_models::SourceIdError) -> Self {
        Self::Media(e.into())
    }
}

impl WorkerError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn processing_failed(msg: impl Into<String>) -> Self {
        Self::ProcessingFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            WorkerError::Media(e) => e.is_retryable(),
            WorkerError::Transcribe(e) => e.is_retryable(),
            WorkerError::Storage(_) | WorkerError::Io(_) => true,
            _ => false,
        }
    }

    /// Whether the request itself was at fault (bad URL, private source, bad options).
    pub fn is_client_error(&self) -> bool {
        match self {
            WorkerError::InvalidRequest(_) => true,
            WorkerError::Media(e) => e.is_client_error(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voxclip_media::{AcquisitionKind, MediaError};

    #[test]
    fn test_client_errors() {
        let bad_url: WorkerError = voxclip_models::extract_source_id("https://example.com/x")
            .unwrap_err()
            .into();
        assert!(bad_url.is_client_error());
        assert!(!bad_url.is_retryable());

        let private: WorkerError = MediaError::acquisition(AcquisitionKind::Private, "private").into();
        assert!(private.is_client_error());

        assert!(WorkerError::invalid_request("padding").is_client_error());
    }

    #[test]
    fn test_network_failures_are_retryable() {
        let err: WorkerError = MediaError::acquisition(AcquisitionKind::Network, "timed out").into();
        assert!(err.is_retryable());
        assert!(!err.is_client_error());
    }
}
