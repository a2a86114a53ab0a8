use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;

use crate::{error::ReportError, model::ImageRef};

use super::{ImageSource, persist_capture};

/// Highest resolution first.
const QUALITY_ORDER: [&str; 3] = ["maxres", "high", "default"];

/// Downloads the current thumbnail of a YouTube livestream.
#[derive(Debug, Clone)]
pub struct ThumbnailSource {
    http: Client,
    api_base: String,
    api_key: String,
    video_id: String,
    capture_dir: PathBuf,
    tz: Tz,
}

impl ThumbnailSource {
    pub fn new(
        api_base: impl Into<String>,
        api_key: impl Into<String>,
        video_id: impl Into<String>,
        capture_dir: impl Into<PathBuf>,
        tz: Tz,
    ) -> Self {
        Self {
            http: Client::new(),
            api_base: api_base.into(),
            api_key: api_key.into(),
            video_id: video_id.into(),
            capture_dir: capture_dir.into(),
            tz,
        }
    }

    /// Resolve the best thumbnail URL for the livestream.
    pub async fn live_thumbnail_url(&self) -> Result<String, ReportError> {
        log::info!("Looking up livestream {}", self.video_id);

        let video = self.fetch_video().await.map_err(|e| {
            let msg = ReportError::chain(&e);
            log::error!("Error getting video details: {msg}");
            ReportError::StreamUnavailable(msg)
        })?;

        let Some(video) = video else {
            log::error!("Video {} not found", self.video_id);
            return Err(ReportError::NotFound(self.video_id.clone()));
        };

        if video.live_streaming_details.is_none() {
            log::error!("Video {} is not a livestream", self.video_id);
            return Err(ReportError::NotLive(self.video_id.clone()));
        }

        select_thumbnail(&video.snippet.thumbnails).ok_or_else(|| {
            log::error!("Video {} has no thumbnails", self.video_id);
            ReportError::NotFound(format!("{} (no thumbnails)", self.video_id))
        })
    }

    async fn fetch_video(&self) -> Result<Option<YtVideo>> {
        let url = format!("{}/videos", self.api_base);
        log::debug!("YouTube videos request: {url}");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("part", "snippet,liveStreamingDetails"),
                ("id", self.video_id.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request to YouTube (videos)")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read YouTube videos response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "YouTube videos request failed with status {}: {}",
                status,
                crate::truncate_body(&body),
            ));
        }

        let parsed: YtVideoList =
            serde_json::from_str(&body).context("Failed to parse YouTube videos JSON")?;

        Ok(parsed.items.into_iter().next())
    }

    async fn download(&self, url: &str) -> Result<PathBuf> {
        log::debug!("Downloading thumbnail: {url}");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .context("Failed to send thumbnail download request")?
            .error_for_status()
            .context("Thumbnail download was rejected")?;

        let bytes = res.bytes().await.context("Failed to read thumbnail body")?;
        let now = Utc::now().with_timezone(&self.tz);

        persist_capture(&self.capture_dir, &now, &bytes).await
    }
}

#[async_trait]
impl ImageSource for ThumbnailSource {
    async fn acquire(&self) -> Result<Vec<ImageRef>, ReportError> {
        let url = self.live_thumbnail_url().await?;

        let path = self.download(&url).await.map_err(|e| {
            let msg = ReportError::chain(&e);
            log::error!("Error downloading thumbnail: {msg}");
            ReportError::Capture(msg)
        })?;

        Ok(vec![ImageRef::Local(path)])
    }
}

fn select_thumbnail(thumbnails: &YtThumbnails) -> Option<String> {
    QUALITY_ORDER
        .iter()
        .find_map(|quality| thumbnails.tier(quality))
        .map(|t| t.url.clone())
}

#[derive(Debug, Deserialize)]
struct YtVideoList {
    #[serde(default)]
    items: Vec<YtVideo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YtVideo {
    snippet: YtSnippet,
    live_streaming_details: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct YtSnippet {
    #[serde(default)]
    thumbnails: YtThumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct YtThumbnails {
    maxres: Option<YtThumbnail>,
    high: Option<YtThumbnail>,
    default: Option<YtThumbnail>,
}

impl YtThumbnails {
    fn tier(&self, quality: &str) -> Option<&YtThumbnail> {
        match quality {
            "maxres" => self.maxres.as_ref(),
            "high" => self.high.as_ref(),
            "default" => self.default.as_ref(),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct YtThumbnail {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn video_json(server_url: &str, live: bool, tiers: &[&str]) -> String {
        let thumbs: serde_json::Map<String, serde_json::Value> = tiers
            .iter()
            .map(|t| {
                (t.to_string(), serde_json::json!({ "url": format!("{server_url}/vi/{t}.jpg") }))
            })
            .collect();

        let mut video = serde_json::json!({
            "id": "abc123",
            "snippet": { "title": "Beach cam", "thumbnails": thumbs }
        });
        if live {
            video["liveStreamingDetails"] =
                serde_json::json!({ "actualStartTime": "2024-05-01T10:00:00Z" });
        }
        serde_json::json!({ "items": [video] }).to_string()
    }

    fn source(server_url: &str, capture_dir: PathBuf) -> ThumbnailSource {
        ThumbnailSource::new(server_url, "KEY", "abc123", capture_dir, chrono_tz::America::Chicago)
    }

    #[test]
    fn prefers_highest_available_tier() {
        let thumbs = YtThumbnails {
            maxres: None,
            high: Some(YtThumbnail { url: "high.jpg".into() }),
            default: Some(YtThumbnail { url: "default.jpg".into() }),
        };
        assert_eq!(select_thumbnail(&thumbs).as_deref(), Some("high.jpg"));
        assert_eq!(select_thumbnail(&YtThumbnails::default()), None);
    }

    #[tokio::test]
    async fn downloads_maxres_thumbnail_of_live_video() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let dir = tempfile::tempdir().unwrap();

        let lookup = server
            .mock("GET", "/videos")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "abc123".into()),
                Matcher::UrlEncoded("key".into(), "KEY".into()),
                Matcher::UrlEncoded("part".into(), "snippet,liveStreamingDetails".into()),
            ]))
            .with_status(200)
            .with_body(video_json(&url, true, &["default", "high", "maxres"]))
            .create_async()
            .await;
        let image = server
            .mock("GET", "/vi/maxres.jpg")
            .with_status(200)
            .with_body("JPEGDATA")
            .create_async()
            .await;

        let images = source(&url, dir.path().to_path_buf()).acquire().await.unwrap();

        lookup.assert_async().await;
        image.assert_async().await;
        let [ImageRef::Local(path)] = images.as_slice() else {
            panic!("expected one local image, got {images:?}");
        };
        assert_eq!(std::fs::read(path).unwrap(), b"JPEGDATA");
        assert_eq!(std::fs::read(dir.path().join("capture_latest.jpg")).unwrap(), b"JPEGDATA");
    }

    #[tokio::test]
    async fn unknown_video_is_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _lookup = server
            .mock("GET", "/videos")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"items": []}"#)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = source(&server.url(), dir.path().to_path_buf()).acquire().await.unwrap_err();

        assert!(matches!(err, ReportError::NotFound(id) if id == "abc123"));
    }

    #[tokio::test]
    async fn recorded_video_is_not_live() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let _lookup = server
            .mock("GET", "/videos")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(video_json(&url, false, &["high"]))
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let err = source(&url, dir.path().to_path_buf()).acquire().await.unwrap_err();

        assert!(matches!(err, ReportError::NotLive(_)));
        assert!(!dir.path().join("capture_latest.jpg").exists());
    }

    #[tokio::test]
    async fn failed_download_is_a_capture_error() {
        let mut server = mockito::Server::new_async().await;
        let url = server.url();
        let _lookup = server
            .mock("GET", "/videos")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(video_json(&url, true, &["default"]))
            .create_async()
            .await;
        let _image = server.mock("GET", "/vi/default.jpg").with_status(404).create_async().await;

        let dir = tempfile::tempdir().unwrap();
        let err = source(&url, dir.path().to_path_buf()).acquire().await.unwrap_err();

        assert!(matches!(err, ReportError::Capture(_)));
    }
}
