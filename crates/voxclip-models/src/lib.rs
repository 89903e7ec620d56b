//! Shared data models for the voxclip pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Source metadata fetched from the upstream platform
//! - Voiced time segments and the clips cut from them
//! - Records handed to and returned by the persistence layer
//! - Source identifier extraction from URLs

pub mod clip;
pub mod persisted;
pub mod segment;
pub mod source;
pub mod utils;

// Re-export common types
pub use clip::{clip_name, Clip, DurationPolicy};
pub use persisted::{PersistedAudio, PersistedVideo};
pub use segment::VoiceSegment;
pub use source::{parse_upload_date, SourceId, SourceMetadata};
pub use utils::{extract_source_id, round2, SourceIdError, SourceIdResult};
