//! Audio clip worker binary.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use voxclip_media::{EnhancerHandle, YtDlpAcquirer};
use voxclip_models::extract_source_id;
use voxclip_storage::{ObjectStore, R2Client};
use voxclip_transcribe::{GoogleSpeechClient, Transcriber};
use voxclip_worker::cli::{Cli, Commands, ProcessArgs};
use voxclip_worker::{
    init_tracing, ClipPipeline, ClipPublisher, JsonCatalog, ProcessOutcome, WorkerConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Commands::ExtractId { url } => {
            println!("{}", extract_source_id(&url)?);
            Ok(())
        }
        Commands::Process(args) => process(args).await,
    }
}

async fn process(args: ProcessArgs) -> anyhow::Result<()> {
    let config = WorkerConfig::from_env();
    config.validate()?;
    info!("Worker config: {:?}", config);

    let options = args.options(&config);
    let acquirer = Arc::new(YtDlpAcquirer::new(config.command_timeout_secs)?
        .with_sample_rate(config.intermediate_rate));
    let enhancer = config
        .enhancer_model
        .as_ref()
        .map(|path| Arc::new(EnhancerHandle::onnx(path, config.intermediate_rate)));

    let pipeline = ClipPipeline::new(config.clone(), acquirer, enhancer);

    let outcome = if args.no_catalog {
        let (metadata, clips) = pipeline.process(&args.url, &options).await?;
        ProcessOutcome {
            source_id: metadata.source_id.clone(),
            is_new: true,
            metadata,
            clips,
        }
    } else {
        let catalog = Arc::new(JsonCatalog::open(config.catalog_path()).await?);
        let outcome = pipeline
            .process_with_catalog(&args.url, &options, catalog.as_ref())
            .await?;

        if outcome.is_new {
            let mut publisher = ClipPublisher::new(catalog);
            if args.publish {
                if let Some(transcriber) = transcriber() {
                    publisher = publisher.with_transcriber(transcriber);
                }
                if let Some(store) = store().await {
                    publisher = publisher.with_store(store);
                }
            }
            let report = publisher.publish(&outcome.metadata, &outcome.clips).await?;
            if !report.failed_uploads.is_empty() {
                warn!("{} clip uploads failed", report.failed_uploads.len());
            }
        }
        outcome
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

fn transcriber() -> Option<Arc<dyn Transcriber>> {
    match GoogleSpeechClient::from_env() {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("Transcription disabled: {}", e);
            None
        }
    }
}

async fn store() -> Option<Arc<dyn ObjectStore>> {
    match R2Client::from_env().await {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            warn!("Uploads disabled: {}", e);
            None
        }
    }
}
