//! Google Cloud Speech-to-Text REST client.
//!
//! Clips are sent inline (base64) to `v1/speech:recognize` as LINEAR16.
//! The first alternative of every result is joined with spaces.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{TranscribeError, TranscribeResult};
use crate::Transcriber;

pub const DEFAULT_ENDPOINT: &str = "https://speech.googleapis.com";
pub const DEFAULT_LANGUAGE: &str = "si";

/// Speech API settings.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub api_key: String,
    /// Base URL, without the `/v1/...` path.
    pub endpoint: String,
    /// BCP-47 language code.
    pub language_code: String,
    pub sample_rate_hz: u32,
    pub timeout_secs: u64,
}

impl SpeechConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            language_code: DEFAULT_LANGUAGE.to_string(),
            sample_rate_hz: 16_000,
            timeout_secs: 60,
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> TranscribeResult<Self> {
        let api_key = std::env::var("GOOGLE_SPEECH_API_KEY")
            .map_err(|_| TranscribeError::config("GOOGLE_SPEECH_API_KEY not set"))?;

        let mut config = Self::new(api_key);
        if let Ok(endpoint) = std::env::var("GOOGLE_SPEECH_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Ok(language) = std::env::var("GOOGLE_SPEECH_LANGUAGE") {
            config.language_code = language;
        }
        Ok(config)
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_language(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = language_code.into();
        self
    }

    fn recognize_url(&self) -> String {
        format!(
            "{}/v1/speech:recognize?key={}",
            self.endpoint.trim_end_matches('/'),
            self.api_key
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognizeRequest<'a> {
    config: RecognitionConfig<'a>,
    audio: RecognitionAudio,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RecognitionConfig<'a> {
    encoding: &'static str,
    sample_rate_hertz: u32,
    language_code: &'a str,
    enable_automatic_punctuation: bool,
}

#[derive(Debug, Serialize)]
struct RecognitionAudio {
    content: String,
}

#[derive(Debug, Default, Deserialize)]
struct RecognizeResponse {
    #[serde(default)]
    results: Vec<RecognitionResult>,
}

#[derive(Debug, Deserialize)]
struct RecognitionResult {
    #[serde(default)]
    alternatives: Vec<Alternative>,
}

#[derive(Debug, Deserialize)]
struct Alternative {
    #[serde(default)]
    transcript: String,
}

impl RecognizeResponse {
    fn into_transcript(self) -> Option<String> {
        let parts: Vec<String> = self
            .results
            .into_iter()
            .filter_map(|r| r.alternatives.into_iter().next())
            .map(|a| a.transcript.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

/// Speech-to-Text client.
#[derive(Debug, Clone)]
pub struct GoogleSpeechClient {
    config: SpeechConfig,
    client: Client,
}

impl GoogleSpeechClient {
    pub fn new(config: SpeechConfig) -> TranscribeResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    /// Create from environment variables.
    pub fn from_env() -> TranscribeResult<Self> {
        Self::new(SpeechConfig::from_env()?)
    }

    /// Recognize speech in raw LINEAR16 audio bytes.
    pub async fn recognize(&self, audio: &[u8]) -> TranscribeResult<Option<String>> {
        let request = RecognizeRequest {
            config: RecognitionConfig {
                encoding: "LINEAR16",
                sample_rate_hertz: self.config.sample_rate_hz,
                language_code: &self.config.language_code,
                enable_automatic_punctuation: true,
            },
            audio: RecognitionAudio {
                content: BASE64.encode(audio),
            },
        };

        debug!(bytes = audio.len(), "Sending recognize request");

        let response = self
            .client
            .post(self.config.recognize_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Api { status, body });
        }

        let parsed: RecognizeResponse = response.json().await?;
        Ok(parsed.into_transcript())
    }
}

#[async_trait]
impl Transcriber for GoogleSpeechClient {
    async fn transcribe(&self, local_path: &Path) -> TranscribeResult<Option<String>> {
        let audio = tokio::fs::read(local_path).await?;
        let transcript = self.recognize(&audio).await?;

        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        match &transcript {
            Some(_) => info!("Transcribed {}", name),
            None => warn!("No transcription found for {}", name),
        }

        Ok(transcript)
    }
}
