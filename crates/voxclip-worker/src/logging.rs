//! Structured source logging and subscriber setup.
//!
//! Provides consistent, structured logging for pipeline runs with
//! tracing spans and contextual information.

use tracing::{error, info, warn, Span};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Source logger for structured logging with consistent formatting.
///
/// Every event carries the source identifier and the current stage.
#[derive(Debug, Clone)]
pub struct SourceLogger {
    source_id: String,
    stage: String,
}

impl SourceLogger {
    pub fn new(source_id: &str, stage: &str) -> Self {
        Self {
            source_id: source_id.to_string(),
            stage: stage.to_string(),
        }
    }

    /// Same source, different stage.
    pub fn stage(&self, stage: &str) -> Self {
        Self::new(&self.source_id, stage)
    }

    pub fn log_start(&self, message: &str) {
        info!(
            source_id = %self.source_id,
            stage = %self.stage,
            "Stage started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            source_id = %self.source_id,
            stage = %self.stage,
            "Stage progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            source_id = %self.source_id,
            stage = %self.stage,
            "Stage warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            source_id = %self.source_id,
            stage = %self.stage,
            "Stage error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            source_id = %self.source_id,
            stage = %self.stage,
            "Stage completed: {}", message
        );
    }

    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn stage_name(&self) -> &str {
        &self.stage
    }

    /// Create a tracing span for this source.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "source",
            source_id = %self.source_id,
            stage = %self.stage
        )
    }
}

/// Install the global subscriber.
///
/// JSON output when `LOG_FORMAT=json`, colored text otherwise. `RUST_LOG`
/// directives are combined with `voxclip=info` and quiet ONNX Runtime logs.
pub fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    for directive in ["voxclip=info", "ort=warn", "onnxruntime=warn"] {
        if let Ok(directive) = directive.parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_logger_creation() {
        let logger = SourceLogger::new("abcdefghijk", "acquire");

        assert_eq!(logger.source_id(), "abcdefghijk");
        assert_eq!(logger.stage_name(), "acquire");
    }

    #[test]
    fn test_stage_switch_keeps_source() {
        let logger = SourceLogger::new("abcdefghijk", "acquire").stage("segment");

        assert_eq!(logger.source_id(), "abcdefghijk");
        assert_eq!(logger.stage_name(), "segment");
    }
}
