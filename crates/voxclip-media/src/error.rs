//! Error types for media operations.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use voxclip_models::SourceIdError;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Why an upstream fetch failed, decided once where the fetch happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionKind {
    /// The source does not exist or was removed.
    NotFound,
    /// The source exists but is private or needs sign-in.
    Private,
    /// Region, age, copyright, or live-stream restrictions.
    Unavailable,
    /// Transport failures, timeouts, rate limiting.
    Network,
    /// Anything the upstream tool did not explain.
    Other,
}

impl AcquisitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AcquisitionKind::NotFound => "not_found",
            AcquisitionKind::Private => "private",
            AcquisitionKind::Unavailable => "unavailable",
            AcquisitionKind::Network => "network",
            AcquisitionKind::Other => "other",
        }
    }

    /// Whether the caller should treat this as a client-side problem.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AcquisitionKind::NotFound | AcquisitionKind::Private | AcquisitionKind::Unavailable
        )
    }
}

impl fmt::Display for AcquisitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse error classification for the layer that maps errors to user-facing codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    IdentifierExtraction,
    Dependency,
    Acquisition(AcquisitionKind),
    ArtifactNotFound,
    Format,
    Config,
    Enhancement,
    Internal,
}

/// Errors that can occur during media processing.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Identifier extraction failed: {0}")]
    IdentifierExtraction(#[from] SourceIdError),

    #[error("{tool} not found in PATH")]
    DependencyMissing { tool: &'static str },

    #[error("Acquisition failed ({kind}): {message}")]
    Acquisition {
        kind: AcquisitionKind,
        message: String,
    },

    #[error("Downloaded artifact not found for {0}")]
    ArtifactNotFound(PathBuf),

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Invalid audio format: {0}")]
    InvalidAudioFormat(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Enhancement inference failed: {0}")]
    Enhancement(String),

    #[error("Enhancement model not found: {0}")]
    ModelNotFound(String),

    #[error("Voice activity detection failed: {0}")]
    Vad(String),

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an acquisition failure error.
    pub fn acquisition(kind: AcquisitionKind, message: impl Into<String>) -> Self {
        Self::Acquisition {
            kind,
            message: message.into(),
        }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create an invalid audio format error.
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidAudioFormat(message.into())
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Create an enhancement inference error.
    pub fn enhancement(message: impl Into<String>) -> Self {
        Self::Enhancement(message.into())
    }

    /// Create a VAD error.
    pub fn vad(message: impl Into<String>) -> Self {
        Self::Vad(message.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Classify this error for the external layer.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MediaError::IdentifierExtraction(_) => ErrorKind::IdentifierExtraction,
            MediaError::DependencyMissing { .. } => ErrorKind::Dependency,
            MediaError::Acquisition { kind, .. } => ErrorKind::Acquisition(*kind),
            MediaError::ArtifactNotFound(_) => ErrorKind::ArtifactNotFound,
            MediaError::InvalidAudioFormat(_)
            | MediaError::UnsupportedFormat(_)
            | MediaError::Wav(_) => ErrorKind::Format,
            MediaError::InvalidConfig(_) => ErrorKind::Config,
            MediaError::Enhancement(_) | MediaError::ModelNotFound(_) => ErrorKind::Enhancement,
            _ => ErrorKind::Internal,
        }
    }

    /// Whether the failure was caused by the request rather than the system.
    pub fn is_client_error(&self) -> bool {
        match self.kind() {
            ErrorKind::IdentifierExtraction | ErrorKind::Config => true,
            ErrorKind::Acquisition(kind) => kind.is_client_error(),
            _ => false,
        }
    }

    /// Whether the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            MediaError::Acquisition {
                kind: AcquisitionKind::Network | AcquisitionKind::Other,
                ..
            } | MediaError::Timeout(_)
        )
    }
}
