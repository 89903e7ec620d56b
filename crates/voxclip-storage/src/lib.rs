//! Object storage for published clips.
//!
//! This crate provides:
//! - The [`ObjectStore`] upload seam
//! - A Cloudflare R2 client (S3 API)
//! - A local-disk store for development and tests

pub mod client;
pub mod error;
pub mod local;
pub mod store;

pub use client::{R2Client, R2Config};
pub use error::{StorageError, StorageResult};
pub use local::LocalStore;
pub use store::{clip_key, content_type_for, validate_key, ObjectStore};
