//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;

use voxclip_media::{
    ClipConfig, EnhancementConfig, VadConfig, INTERMEDIATE_SAMPLE_RATE, TARGET_SAMPLE_RATE,
};
use voxclip_models::DurationPolicy;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Parent directory for per-invocation temporary directories
    pub work_dir: PathBuf,
    /// Clips land in `<output_dir>/<source_id>/`
    pub output_dir: PathBuf,
    /// Minimum accepted clip duration (seconds, inclusive)
    pub min_clip_duration: f64,
    /// Maximum accepted clip duration (seconds, inclusive)
    pub max_clip_duration: f64,
    /// Default VAD aggressiveness (0-3)
    pub vad_aggressiveness: u8,
    /// Default silence before each clip (seconds)
    pub start_padding: f64,
    /// Default silence after each clip (seconds)
    pub end_padding: f64,
    /// VAD frame duration (ms)
    pub frame_ms: u32,
    /// VAD hangover window (ms)
    pub padding_window_ms: u32,
    /// Fraction of the hangover window needed for a transition
    pub trigger_ratio: f64,
    /// Enhancement chunk length (seconds)
    pub enhance_chunk_secs: f64,
    /// ONNX enhancement model; enhancement is skipped when unset
    pub enhancer_model: Option<PathBuf>,
    /// Rate the acquirer normalizes to
    pub intermediate_rate: u32,
    /// Rate of the VAD stage and of written clips
    pub target_rate: u32,
    /// JSON catalog file; defaults to `<output_dir>/catalog.json`
    pub catalog_path: Option<PathBuf>,
    /// Timeout for each yt-dlp / FFmpeg invocation
    pub command_timeout_secs: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("/tmp/voxclip"),
            output_dir: PathBuf::from("./output"),
            min_clip_duration: 4.0,
            max_clip_duration: 10.0,
            vad_aggressiveness: 2,
            start_padding: 1.0,
            end_padding: 0.5,
            frame_ms: 30,
            padding_window_ms: 300,
            trigger_ratio: 0.9,
            enhance_chunk_secs: 600.0,
            enhancer_model: None,
            intermediate_rate: INTERMEDIATE_SAMPLE_RATE,
            target_rate: TARGET_SAMPLE_RATE,
            catalog_path: None,
            command_timeout_secs: 3600, // 1 hour
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var(key)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            work_dir: env_path("VOXCLIP_WORK_DIR").unwrap_or(defaults.work_dir),
            output_dir: env_path("VOXCLIP_OUTPUT_DIR").unwrap_or(defaults.output_dir),
            min_clip_duration: env_or("VOXCLIP_MIN_CLIP_DURATION", defaults.min_clip_duration),
            max_clip_duration: env_or("VOXCLIP_MAX_CLIP_DURATION", defaults.max_clip_duration),
            vad_aggressiveness: env_or("VOXCLIP_VAD_AGGRESSIVENESS", defaults.vad_aggressiveness),
            start_padding: env_or("VOXCLIP_START_PADDING", defaults.start_padding),
            end_padding: env_or("VOXCLIP_END_PADDING", defaults.end_padding),
            frame_ms: env_or("VOXCLIP_FRAME_MS", defaults.frame_ms),
            padding_window_ms: env_or("VOXCLIP_PADDING_WINDOW_MS", defaults.padding_window_ms),
            trigger_ratio: env_or("VOXCLIP_TRIGGER_RATIO", defaults.trigger_ratio),
            enhance_chunk_secs: env_or("VOXCLIP_ENHANCE_CHUNK_SECS", defaults.enhance_chunk_secs),
            enhancer_model: env_path("VOXCLIP_ENHANCER_MODEL"),
            intermediate_rate: env_or("VOXCLIP_INTERMEDIATE_RATE", defaults.intermediate_rate),
            target_rate: env_or("VOXCLIP_TARGET_RATE", defaults.target_rate),
            catalog_path: env_path("VOXCLIP_CATALOG_PATH"),
            command_timeout_secs: env_or(
                "VOXCLIP_COMMAND_TIMEOUT_SECS",
                defaults.command_timeout_secs,
            ),
        }
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_enhancer_model(mut self, path: impl Into<PathBuf>) -> Self {
        self.enhancer_model = Some(path.into());
        self
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> WorkerResult<()> {
        let bounds_ok = self.min_clip_duration.is_finite()
            && self.max_clip_duration.is_finite()
            && self.min_clip_duration >= 0.0
            && self.min_clip_duration <= self.max_clip_duration;
        if !bounds_ok {
            return Err(WorkerError::config_error(format!(
                "clip duration bounds [{}, {}] are invalid",
                self.min_clip_duration, self.max_clip_duration
            )));
        }
        self.enhancement_config()
            .validate()
            .map_err(|e| WorkerError::config_error(e.to_string()))?;
        self.vad_config(self.vad_aggressiveness)
            .validate()
            .map_err(|e| WorkerError::config_error(e.to_string()))?;
        if self.intermediate_rate == 0 || self.target_rate == 0 {
            return Err(WorkerError::config_error("sample rates must be non-zero"));
        }
        Ok(())
    }

    /// Per-source clip directory.
    pub fn source_dir(&self, source_id: &str) -> PathBuf {
        self.output_dir.join(source_id)
    }

    pub fn catalog_path(&self) -> PathBuf {
        self.catalog_path
            .clone()
            .unwrap_or_else(|| self.output_dir.join("catalog.json"))
    }

    pub fn duration_policy(&self) -> DurationPolicy {
        DurationPolicy::new(self.min_clip_duration, self.max_clip_duration)
    }

    /// VAD settings with the given aggressiveness.
    pub fn vad_config(&self, aggressiveness: u8) -> VadConfig {
        VadConfig::default()
            .with_frame_ms(self.frame_ms)
            .with_padding_window_ms(self.padding_window_ms)
            .with_trigger_ratio(self.trigger_ratio)
            .with_aggressiveness(aggressiveness)
    }

    pub fn clip_config(&self, start_padding: f64, end_padding: f64) -> ClipConfig {
        ClipConfig::default()
            .with_padding(start_padding, end_padding)
            .with_policy(self.duration_policy())
    }

    pub fn enhancement_config(&self) -> EnhancementConfig {
        EnhancementConfig::default().with_chunk_secs(self.enhance_chunk_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.intermediate_rate, 48000);
        assert_eq!(config.target_rate, 16000);
        assert_eq!(config.vad_config(2).window_frames(), 10);
        assert!(config.enhancer_model.is_none());
        assert_eq!(config.catalog_path(), PathBuf::from("./output/catalog.json"));
    }

    #[test]
    fn test_derived_configs() {
        let config = WorkerConfig::default().with_output_dir("/data/clips");
        let clip = config.clip_config(0.25, 0.75);
        assert_eq!(clip.start_padding, 0.25);
        assert_eq!(clip.end_padding, 0.75);
        assert!(clip.policy.accepts(4.0));
        assert_eq!(config.source_dir("abcdefghijk"), PathBuf::from("/data/clips/abcdefghijk"));
        assert_eq!(config.enhancement_config().chunk_secs, 600.0);
    }

    #[test]
    fn test_validate_rejects_unusable_settings() {
        assert!(WorkerConfig::default().validate().is_ok());

        let inverted = WorkerConfig {
            min_clip_duration: 10.0,
            max_clip_duration: 4.0,
            ..WorkerConfig::default()
        };
        assert!(matches!(inverted.validate(), Err(WorkerError::ConfigError(_))));

        let zero_chunks = WorkerConfig {
            enhance_chunk_secs: 0.0,
            ..WorkerConfig::default()
        };
        assert!(matches!(zero_chunks.validate(), Err(WorkerError::ConfigError(_))));

        let bad_ratio = WorkerConfig {
            trigger_ratio: 1.0,
            ..WorkerConfig::default()
        };
        assert!(matches!(bad_ratio.validate(), Err(WorkerError::ConfigError(_))));
    }

    #[test]
    fn test_env_or_falls_back_on_garbage() {
        std::env::set_var("VOXCLIP_TEST_ENV_OR", "not-a-number");
        assert_eq!(env_or("VOXCLIP_TEST_ENV_OR", 7u32), 7);
        std::env::set_var("VOXCLIP_TEST_ENV_OR", "12");
        assert_eq!(env_or("VOXCLIP_TEST_ENV_OR", 7u32), 12);
        std::env::remove_var("VOXCLIP_TEST_ENV_OR");
    }
}
