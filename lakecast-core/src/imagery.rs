//! Still images of the monitored location.
//!
//! Three interchangeable sources are provided: a livestream thumbnail from the
//! YouTube Data API, a single frame grabbed from the live stream itself, and
//! fixed camera URLs that are passed to the model without downloading.

use std::{
    fmt::Debug,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone};

use crate::{error::ReportError, model::ImageRef};

pub mod camera;
pub mod frame;
pub mod thumbnail;

pub use camera::CameraSource;
pub use frame::FrameCaptureSource;
pub use thumbnail::ThumbnailSource;

const LATEST_CAPTURE: &str = "capture_latest.jpg";

#[async_trait]
pub trait ImageSource: Send + Sync + Debug {
    async fn acquire(&self) -> Result<Vec<ImageRef>, ReportError>;
}

/// Where a capture taken at `now` lives: `<root>/YYYY/MM/DD/capture_YYYYMMDD_HHMMSS.jpg`.
pub fn dated_capture_path<Tz: TimeZone>(root: &Path, now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    root.join(now.format("%Y").to_string())
        .join(now.format("%m").to_string())
        .join(now.format("%d").to_string())
        .join(format!("capture_{}.jpg", now.format("%Y%m%d_%H%M%S")))
}

pub fn latest_capture_path(root: &Path) -> PathBuf {
    root.join(LATEST_CAPTURE)
}

/// Write `bytes` to the dated path and mirror them to the fixed "latest" path.
/// Returns the dated path.
pub(crate) async fn persist_capture<Tz: TimeZone>(
    root: &Path,
    now: &DateTime<Tz>,
    bytes: &[u8],
) -> Result<PathBuf>
where
    Tz::Offset: std::fmt::Display,
{
    let dated = dated_capture_path(root, now);
    if let Some(parent) = dated.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create capture directory: {}", parent.display()))?;
    }

    tokio::fs::write(&dated, bytes)
        .await
        .with_context(|| format!("Failed to write capture: {}", dated.display()))?;

    let latest = latest_capture_path(root);
    tokio::fs::write(&latest, bytes)
        .await
        .with_context(|| format!("Failed to write latest capture: {}", latest.display()))?;

    log::info!("Captured image saved to: {}", dated.display());
    log::info!("Latest capture copied to: {}", latest.display());

    Ok(dated)
}
