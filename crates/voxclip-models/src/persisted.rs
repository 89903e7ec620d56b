//! Records owned by the persistence collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clip::Clip;
use crate::source::SourceMetadata;

/// A source as stored by the persistence layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedVideo {
    pub id: Uuid,
    pub metadata: SourceMetadata,
    pub created_at: DateTime<Utc>,
}

impl PersistedVideo {
    pub fn new(metadata: SourceMetadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// A clip as stored by the persistence layer.
///
/// `start_secs`/`end_secs` are elapsed seconds into the source, never a
/// time of day, so sources longer than a day do not alias.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedAudio {
    pub id: Uuid,
    pub video_id: Uuid,
    /// File name of the clip, including extension.
    pub filename: String,
    pub start_secs: f64,
    pub end_secs: f64,
    pub padded_duration: f64,
    #[serde(default)]
    pub transcription: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PersistedAudio {
    pub fn new(clip: &Clip, video_id: Uuid, transcription: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            video_id,
            filename: clip.file_name(),
            start_secs: clip.start_time,
            end_secs: clip.end_time,
            padded_duration: clip.padded_duration,
            transcription,
            url: None,
            created_at: Utc::now(),
        }
    }

    /// Clip name without the `.wav` extension.
    pub fn clip_name(&self) -> &str {
        self.filename
            .strip_suffix(".wav")
            .unwrap_or(&self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::VoiceSegment;

    #[test]
    fn test_persisted_audio_keeps_elapsed_seconds() {
        // 25 hours in: must not wrap around a day
        let segment = VoiceSegment::new(90_000.0, 90_005.5);
        let clip = Clip::from_segment("abcdefghijk-001".into(), &segment, 1.0, 0.5);
        let record = PersistedAudio::new(&clip, Uuid::new_v4(), None);

        assert_eq!(record.start_secs, 90_000.0);
        assert_eq!(record.end_secs, 90_005.5);
        assert_eq!(record.filename, "abcdefghijk-001.wav");
        assert_eq!(record.clip_name(), "abcdefghijk-001");
    }
}
