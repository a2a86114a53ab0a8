use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use tokio::fs;

use crate::{error::ReportError, model::Report};

#[derive(Debug, Clone)]
pub struct ResultWriter {
    path: PathBuf,
}

impl ResultWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the artifact with `report`. The JSON goes to a sibling temp
    /// file first and is renamed over the target, so readers never see a
    /// half-written report.
    pub async fn write(&self, report: &Report) -> Result<(), ReportError> {
        self.write_inner(report).await.map_err(|e| {
            let msg = ReportError::chain(&e);
            log::error!("Error writing report: {msg}");
            ReportError::Write(msg)
        })?;

        log::info!("Weather report written to: {}", self.path.display());
        Ok(())
    }

    async fn write_inner(&self, report: &Report) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }

        let json = to_pretty_json(report)?;
        let tmp = self.temp_path();

        fs::write(&tmp, json)
            .await
            .with_context(|| format!("Failed to write temporary report: {}", tmp.display()))?;

        if let Err(e) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e).with_context(|| {
                format!("Failed to move report into place: {}", self.path.display())
            });
        }

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}

/// Serialize with four-space indentation.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let mut ser = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"    "));
    value.serialize(&mut ser).context("Failed to serialize report to JSON")?;
    buf.push(b'\n');
    Ok(buf)
}
