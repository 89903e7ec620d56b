//! Audio clip worker.
//!
//! This crate provides:
//! - The per-source pipeline (acquire, enhance, resample, segment, extract)
//! - Duplicate-aware processing against a catalog
//! - Publishing of clips (catalog records, transcription, upload)
//! - Environment-driven configuration and structured logging

pub mod catalog;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod publish;

pub use catalog::{Catalog, CatalogError, CatalogResult, JsonCatalog, MemoryCatalog};
pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use logging::{init_tracing, SourceLogger};
pub use pipeline::{ClassifierKind, ClipPipeline, PipelineOptions, ProcessOutcome};
pub use publish::{ClipPublisher, PublishReport};
