use std::{path::PathBuf, process::Stdio};

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use tokio::process::Command;

use crate::{error::ReportError, model::ImageRef};

use super::{ImageSource, persist_capture};

/// Grabs one frame straight from the live stream.
///
/// A stream resolver (yt-dlp) turns the video id into a playable URL, then
/// ffmpeg decodes a single frame and encodes it as JPEG on stdout.
#[derive(Debug, Clone)]
pub struct FrameCaptureSource {
    video_id: String,
    resolver_program: String,
    ffmpeg_program: String,
    capture_dir: PathBuf,
    tz: Tz,
}

impl FrameCaptureSource {
    pub fn new(
        video_id: impl Into<String>,
        resolver_program: impl Into<String>,
        ffmpeg_program: impl Into<String>,
        capture_dir: impl Into<PathBuf>,
        tz: Tz,
    ) -> Self {
        Self {
            video_id: video_id.into(),
            resolver_program: resolver_program.into(),
            ffmpeg_program: ffmpeg_program.into(),
            capture_dir: capture_dir.into(),
            tz,
        }
    }

    fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.video_id)
    }

    async fn resolve_stream_url(&self) -> Result<String> {
        let watch_url = self.watch_url();
        let output = Command::new(&self.resolver_program)
            .args(["-g", "-f", "best", watch_url.as_str()])
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.resolver_program))?;

        if !output.status.success() {
            bail!(
                "{} exited with {}: {}",
                self.resolver_program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        first_line(&output.stdout)
            .ok_or_else(|| anyhow!("{} returned no stream URL", self.resolver_program))
    }

    async fn capture_frame(&self) -> Result<Vec<u8>> {
        let url = self.resolve_stream_url().await?;
        log::debug!("Resolved stream URL: {url}");
        self.read_frame(&url).await
    }

    async fn read_frame(&self, stream_url: &str) -> Result<Vec<u8>> {
        let output = Command::new(&self.ffmpeg_program)
            .args(["-loglevel", "error", "-i", stream_url])
            .args(["-frames:v", "1", "-f", "image2pipe", "-vcodec", "mjpeg", "-"])
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run {}", self.ffmpeg_program))?;

        if !output.status.success() {
            bail!(
                "Could not open video stream ({}): {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        if output.stdout.is_empty() {
            bail!("No frame read from video stream");
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl ImageSource for FrameCaptureSource {
    async fn acquire(&self) -> Result<Vec<ImageRef>, ReportError> {
        log::info!("Capturing a frame from livestream {}", self.video_id);

        let frame = self.capture_frame().await.map_err(|e| {
            let msg = ReportError::chain(&e);
            log::error!("Error capturing frame: {msg}");
            ReportError::StreamUnavailable(msg)
        })?;

        let now = Utc::now().with_timezone(&self.tz);
        let path = persist_capture(&self.capture_dir, &now, &frame).await.map_err(|e| {
            let msg = ReportError::chain(&e);
            log::error!("Error saving frame: {msg}");
            ReportError::Capture(msg)
        })?;

        Ok(vec![ImageRef::Local(path)])
    }
}

fn first_line(stdout: &[u8]) -> Option<String> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_line_skips_blank_output() {
        assert_eq!(
            first_line(b"\n  https://cdn/x.m3u8 \nsecond\n").as_deref(),
            Some("https://cdn/x.m3u8")
        );
        assert_eq!(first_line(b"   \n"), None);
    }

    #[test]
    fn watch_url_embeds_video_id() {
        let src = FrameCaptureSource::new("abc", "yt-dlp", "ffmpeg", "captures", chrono_tz::UTC);
        assert_eq!(src.watch_url(), "https://www.youtube.com/watch?v=abc");
    }

    #[tokio::test]
    async fn missing_resolver_is_stream_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let src = FrameCaptureSource::new(
            "abc",
            "lakecast-no-such-resolver",
            "lakecast-no-such-ffmpeg",
            dir.path(),
            chrono_tz::UTC,
        );

        let err = src.acquire().await.unwrap_err();

        assert!(matches!(err, ReportError::StreamUnavailable(_)));
        assert!(!dir.path().join("capture_latest.jpg").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_resolver_is_stream_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let src = FrameCaptureSource::new("abc", "false", "ffmpeg", dir.path(), chrono_tz::UTC);

        let err = src.acquire().await.unwrap_err();

        assert!(matches!(err, ReportError::StreamUnavailable(msg) if msg.contains("exited")));
    }

    // `echo` stands in for both tools: the resolver "URL" is its argv, and the
    // "frame" is ffmpeg's argv, so the bytes show the URL was handed through.
    #[cfg(unix)]
    #[tokio::test]
    async fn captured_frame_is_saved_dated_and_latest() {
        let dir = tempfile::tempdir().unwrap();
        let src = FrameCaptureSource::new("abc", "echo", "echo", dir.path(), chrono_tz::UTC);

        let images = src.acquire().await.unwrap();

        let [ImageRef::Local(dated)] = images.as_slice() else {
            panic!("expected one local image, got {images:?}");
        };
        assert!(dated.starts_with(dir.path()));
        let name = dated.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("capture_") && name.ends_with(".jpg"));

        let frame = std::fs::read(dated).unwrap();
        let latest = std::fs::read(dir.path().join("capture_latest.jpg")).unwrap();
        assert_eq!(frame, latest);

        let text = String::from_utf8(frame).unwrap();
        assert!(text.contains("https://www.youtube.com/watch?v=abc"));
        assert!(text.contains("mjpeg"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn empty_frame_is_stream_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let src = FrameCaptureSource::new("abc", "echo", "true", dir.path(), chrono_tz::UTC);

        let err = src.acquire().await.unwrap_err();

        assert!(
            matches!(err, ReportError::StreamUnavailable(ref msg) if msg.contains("No frame read")),
            "{err:?}"
        );
        assert!(!dir.path().join("capture_latest.jpg").exists());
    }
}
