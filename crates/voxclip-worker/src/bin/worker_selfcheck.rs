use std::path::Path;

use voxclip_storage::{R2Client, R2Config};
use voxclip_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env();
    config.validate()?;

    println!(
        "worker-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    voxclip_media::check_dependencies()
        .map_err(|e| anyhow::anyhow!("external tools missing: {}", e))?;
    ensure_model(config.enhancer_model.as_deref())?;
    ensure_bucket().await?;

    println!("worker-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir<P: AsRef<Path>>(path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

fn ensure_model(path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) if !path.is_file() => Err(anyhow::anyhow!(
            "enhancement model not found at {}",
            path.display()
        )),
        Some(_) => Ok(()),
        None => {
            println!("worker-selfcheck: no enhancement model configured, enhancement disabled");
            Ok(())
        }
    }
}

/// Only checked when R2 credentials are present.
async fn ensure_bucket() -> anyhow::Result<()> {
    let Ok(r2) = R2Config::from_env() else {
        println!("worker-selfcheck: R2 not configured, uploads disabled");
        return Ok(());
    };
    let client = R2Client::new(r2).await?;
    client.check_connectivity().await?;
    println!("worker-selfcheck: bucket {} reachable", client.bucket());
    Ok(())
}
