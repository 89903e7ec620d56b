//! Transcription error types.

use thiserror::Error;

/// Result type for transcription operations.
pub type TranscribeResult<T> = Result<T, TranscribeError>;

/// Errors that can occur while transcribing a clip.
#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Speech API request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Speech API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to read audio: {0}")]
    Io(#[from] std::io::Error),
}

impl TranscribeError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranscribeError::Request(e) => e.is_timeout() || e.is_connect(),
            TranscribeError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let api = |status| TranscribeError::Api {
            status,
            body: String::new(),
        };
        assert!(api(429).is_retryable());
        assert!(api(503).is_retryable());
        assert!(!api(400).is_retryable());
        assert!(!TranscribeError::config("missing key").is_retryable());
    }
}
