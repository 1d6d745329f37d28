//! Download action: export, save to disk, notify
//!
//! Every failure is caught here and turned into a [`Notification`]; nothing
//! propagates to the caller and the pipeline is always idle afterwards.

use crate::error::{Error, Result};
use crate::export::{ExportArtifact, ExportFormat, ExportJob, ExportPipeline};
use crate::metrics;
use crate::notify::Notification;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

pub const FILENAME_PREFIX: &str = "qr-code-";

static LAST_STAMP: AtomicU64 = AtomicU64::new(0);

/// Milliseconds since the Unix epoch, strictly increasing within the process.
pub fn next_stamp() -> u64 {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let previous = LAST_STAMP
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
            Some(now.max(last + 1))
        })
        .unwrap_or(0);
    now.max(previous + 1)
}

/// `qr-code-<stamp>.<ext>`
pub fn export_filename(format: ExportFormat, stamp: u64) -> String {
    format!("{FILENAME_PREFIX}{stamp}.{}", format.extension())
}

/// Whether `name` has the `qr-code-<digits>.<ext>` shape.
pub fn is_export_filename(name: &str) -> bool {
    let Some(rest) = name.strip_prefix(FILENAME_PREFIX) else {
        return false;
    };
    let Some((stamp, ext)) = rest.split_once('.') else {
        return false;
    };
    !stamp.is_empty()
        && stamp.chars().all(|c| c.is_ascii_digit())
        && ExportFormat::ALL.iter().any(|f| f.extension() == ext)
}

/// Writes artifacts into an output directory
#[derive(Debug, Clone)]
pub struct Downloader {
    output_dir: PathBuf,
}

impl Downloader {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Save `artifact` as `filename` and return the full path.
    pub async fn save(&self, artifact: &ExportArtifact, filename: &str) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.output_dir).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "Failed to create output directory {}: {e}",
                    self.output_dir.display()
                ),
            ))
        })?;

        let path = self.output_dir.join(filename);
        tokio::fs::write(&path, &artifact.bytes).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to write {}: {e}", path.display()),
            ))
        })?;
        Ok(path)
    }
}

/// Result of one download action
#[derive(Debug, Clone)]
pub enum DownloadOutcome {
    /// Export and save succeeded
    Saved {
        path: PathBuf,
        artifact: ExportArtifact,
        notification: Notification,
    },
    /// Export or save failed; the pipeline is idle again
    Failed {
        format: ExportFormat,
        error: String,
        notification: Notification,
    },
    /// Triggers were disabled because another export was running
    Ignored { format: ExportFormat },
}

impl DownloadOutcome {
    pub fn notification(&self) -> Option<&Notification> {
        match self {
            DownloadOutcome::Saved { notification, .. }
            | DownloadOutcome::Failed { notification, .. } => Some(notification),
            DownloadOutcome::Ignored { .. } => None,
        }
    }

    pub fn is_saved(&self) -> bool {
        matches!(self, DownloadOutcome::Saved { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, DownloadOutcome::Failed { .. })
    }
}

/// Run `job` through `pipeline` and save the artifact with `downloader`.
pub async fn download(
    pipeline: &ExportPipeline,
    downloader: &Downloader,
    job: ExportJob,
) -> DownloadOutcome {
    let format = job.format;
    let filename = export_filename(format, next_stamp());
    let started = Instant::now();

    let result = match pipeline.export(job).await {
        Ok(artifact) => downloader
            .save(&artifact, &filename)
            .await
            .map(|path| (path, artifact)),
        Err(err) => Err(err),
    };

    let outcome = match result {
        Ok((path, artifact)) => {
            info!(
                path = %path.display(),
                bytes = artifact.bytes.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Exported QR code"
            );
            metrics::record(started.elapsed(), true, format);
            DownloadOutcome::Saved {
                path,
                artifact,
                notification: Notification::downloaded(format),
            }
        }
        Err(Error::ExportInFlight) => {
            info!(%format, "Export already in progress, ignoring request");
            metrics::record_rejected();
            return DownloadOutcome::Ignored { format };
        }
        Err(err) => {
            warn!(%format, "Download error: {err}");
            metrics::record(started.elapsed(), false, format);
            let notification = match err {
                Error::CaptureTargetMissing => Notification::target_missing(),
                _ => Notification::download_failed(),
            };
            DownloadOutcome::Failed {
                format,
                error: err.to_string(),
                notification,
            }
        }
    };

    if let Some(notification) = outcome.notification() {
        notification.emit();
    }
    outcome
}
