//! Command-line interface for the worker binary.

use clap::{Parser, Subcommand};

use crate::config::WorkerConfig;
use crate::pipeline::{ClassifierKind, PipelineOptions};

/// Cut speech clips out of online videos
#[derive(Parser, Debug)]
#[command(name = "voxclip-worker", version, about = "Cut speech clips out of online videos")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process one source and print a JSON summary
    Process(ProcessArgs),

    /// Print the source identifier of a URL
    ExtractId {
        url: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct ProcessArgs {
    /// Source URL (watch, short link, embed or /v/ path)
    pub url: String,

    /// VAD aggressiveness, 0 (least) to 3 (most)
    #[arg(long, short = 'a', value_name = "LEVEL")]
    pub aggressiveness: Option<u8>,

    /// Silence added before each clip, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub start_padding: Option<f64>,

    /// Silence added after each clip, in seconds
    #[arg(long, value_name = "SECONDS")]
    pub end_padding: Option<f64>,

    /// Frame classifier for voice detection
    #[arg(long, value_enum, default_value = "webrtc")]
    pub classifier: ClassifierKind,

    /// Transcribe and upload clips when those services are configured
    #[arg(long)]
    pub publish: bool,

    /// Skip the catalog: always process, persist nothing
    #[arg(long, conflicts_with = "publish")]
    pub no_catalog: bool,
}

impl ProcessArgs {
    /// Options from the config defaults, overridden by explicit flags.
    pub fn options(&self, config: &WorkerConfig) -> PipelineOptions {
        let defaults = PipelineOptions::from_config(config);
        PipelineOptions {
            aggressiveness: self.aggressiveness.unwrap_or(defaults.aggressiveness),
            start_padding: self.start_padding.unwrap_or(defaults.start_padding),
            end_padding: self.end_padding.unwrap_or(defaults.end_padding),
            classifier: self.classifier,
        }
    }
}
