//! Metadata fetch and audio download using yt-dlp.
//!
//! Failures are classified into an [`AcquisitionKind`] here, at the only
//! place that sees yt-dlp's stderr. Callers match on the kind instead of
//! the message text.

use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use std::time::Duration;

use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use voxclip_models::{parse_upload_date, SourceMetadata};

use crate::command::check_ytdlp;
use crate::error::{AcquisitionKind, MediaError, MediaResult};

/// Extensions probed, in order, when locating a finished download.
const AUDIO_EXTENSIONS: &[&str] = &["webm", "m4a", "mp3", "ogg", "opus", "aac"];

/// Subset of `yt-dlp --dump-single-json` output we care about.
#[derive(Debug, Deserialize)]
struct YtDlpInfo {
    id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    duration: Option<f64>,
    uploader: Option<String>,
    upload_date: Option<String>,
    thumbnail: Option<String>,
    webpage_url: Option<String>,
}

impl YtDlpInfo {
    fn into_metadata(self, source_id: &str, url: &str) -> SourceMetadata {
        SourceMetadata {
            source_id: self.id.unwrap_or_else(|| source_id.to_string()).into(),
            title: self.title,
            description: self.description,
            duration_secs: self.duration,
            uploader: self.uploader,
            upload_date: self.upload_date.as_deref().and_then(parse_upload_date),
            thumbnail: self.thumbnail,
            url: self.webpage_url.unwrap_or_else(|| url.to_string()),
        }
    }
}

/// Fetch descriptive metadata without downloading any media.
pub async fn fetch_metadata(
    url: &str,
    source_id: &str,
    timeout_secs: u64,
) -> MediaResult<SourceMetadata> {
    info!(url = %url, "Fetching source metadata");

    let output = run_ytdlp(
        &[
            "--dump-single-json",
            "--skip-download",
            "--no-playlist",
            "--no-warnings",
            url,
        ],
        timeout_secs,
    )
    .await?;

    let info: YtDlpInfo = serde_json::from_slice(&output.stdout)?;
    let metadata = info.into_metadata(source_id, url);

    debug!(
        source_id = %metadata.source_id,
        title = metadata.display_title(),
        duration_secs = ?metadata.duration_secs,
        "Fetched source metadata"
    );

    Ok(metadata)
}

/// Download the best available audio stream into `work_dir`.
///
/// The file is written as `<stem>_raw.<ext>`, with the extension chosen by
/// yt-dlp; the returned path is the file actually found on disk.
pub async fn download_audio(
    url: &str,
    work_dir: &Path,
    stem: &str,
    timeout_secs: u64,
) -> MediaResult<PathBuf> {
    let template = work_dir.join(format!("{}_raw.%(ext)s", stem));
    let template = template.to_string_lossy();

    info!(url = %url, output = %template, "Downloading best audio stream");

    run_ytdlp(
        &[
            "-f",
            "bestaudio/best",
            "--no-playlist",
            "--no-warnings",
            "--no-part",
            "-o",
            &template,
            url,
        ],
        timeout_secs,
    )
    .await?;

    let path = locate_artifact(work_dir, &format!("{}_raw", stem))?;
    let size = path.metadata()?.len();
    info!(
        path = %path.display(),
        size_mb = size as f64 / (1024.0 * 1024.0),
        "Downloaded audio stream"
    );

    Ok(path)
}

/// Find the downloaded file for `base` in `dir`.
///
/// Probes the known audio extensions first, then any file whose name starts
/// with `base`.
pub fn locate_artifact(dir: &Path, base: &str) -> MediaResult<PathBuf> {
    for ext in AUDIO_EXTENSIONS {
        let candidate = dir.join(format!("{}.{}", base, ext));
        if candidate.is_file() {
            return Ok(candidate);
        }
    }

    let mut matches: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(base))
        })
        .collect();
    matches.sort();

    match matches.into_iter().next() {
        Some(path) => {
            debug!(path = %path.display(), "Located artifact by prefix");
            Ok(path)
        }
        None => Err(MediaError::ArtifactNotFound(dir.join(base))),
    }
}

/// Map yt-dlp stderr to a structured failure kind.
pub fn classify_failure(stderr: &str) -> AcquisitionKind {
    let msg = stderr.to_lowercase();

    if msg.contains("private video")
        || msg.contains("video is private")
        || msg.contains("sign in to confirm your age")
        || msg.contains("members-only")
    {
        AcquisitionKind::Private
    } else if msg.contains("video unavailable")
        || msg.contains("has been removed")
        || msg.contains("does not exist")
        || msg.contains("http error 404")
        || msg.contains("incomplete youtube id")
    {
        AcquisitionKind::NotFound
    } else if msg.contains("not available in your country")
        || msg.contains("copyright")
        || msg.contains("live event")
        || msg.contains("premieres in")
    {
        AcquisitionKind::Unavailable
    } else if msg.contains("timed out")
        || msg.contains("unable to download webpage")
        || msg.contains("connection")
        || msg.contains("http error 429")
        || msg.contains("too many requests")
        || msg.contains("http error 5")
    {
        AcquisitionKind::Network
    } else {
        AcquisitionKind::Other
    }
}

/// Run yt-dlp, turning a non-zero exit into a classified acquisition error.
async fn run_ytdlp(args: &[&str], timeout_secs: u64) -> MediaResult<Output> {
    check_ytdlp()?;

    let child = Command::new("yt-dlp")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()?;

    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait_with_output())
        .await
        .map_err(|_| {
            warn!("yt-dlp timed out after {} seconds", timeout_secs);
            MediaError::acquisition(
                AcquisitionKind::Network,
                format!("yt-dlp timed out after {} seconds", timeout_secs),
            )
        })??;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("yt-dlp stderr: {}", stderr);

        let kind = classify_failure(&stderr);
        let message = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("Unknown error")
            .trim()
            .to_string();

        warn!(kind = %kind, "yt-dlp failed: {}", message);
        return Err(MediaError::acquisition(kind, message));
    }

    Ok(output)
}
