use std::{fmt::Debug, path::Path, time::Duration};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::ReportError, model::ImageRef};

const HTTP_TIMEOUT_SECS: u64 = 300;

/// A multimodal model that answers a text prompt about a set of images.
#[async_trait]
pub trait LanguageModel: Send + Sync + Debug {
    async fn prompt(&self, prompt: &str, images: &[ImageRef]) -> Result<String>;
}

/// OpenAI-compatible chat completions endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiChatModel {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("Failed to build model HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ReportError> {
        let api_key =
            config.openai_api_key().ok_or(ReportError::MissingCredential("openai_api_key"))?;

        Self::new(&config.model.base_url, api_key, &config.model.name)
            .map_err(|e| ReportError::Config(ReportError::chain(&e)))
    }
}

#[async_trait]
impl LanguageModel for OpenAiChatModel {
    async fn prompt(&self, prompt: &str, images: &[ImageRef]) -> Result<String> {
        let mut content = vec![ContentPart::Text { text: prompt.to_string() }];
        for image in images {
            content.push(ContentPart::ImageUrl { image_url: ImageUrl { url: image_url(image).await? } });
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage { role: "user", content }],
        };

        let url = format!("{}/chat/completions", self.base_url);
        log::debug!("Model request: {url} ({}, {} image(s))", self.model, images.len());

        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to model")?;

        let status = res.status();
        let body = res.text().await.context("Failed to read model response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Model request failed with status {}: {}",
                status,
                crate::truncate_body(&body),
            ));
        }

        let parsed: ChatResponse =
            serde_json::from_str(&body).context("Failed to parse model response JSON")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| anyhow!("Model returned no text"))
    }
}

/// Remote images pass by URL; local files are inlined as data URLs.
async fn image_url(image: &ImageRef) -> Result<String> {
    match image {
        ImageRef::Remote(url) => Ok(url.clone()),
        ImageRef::Local(path) => data_url(path).await,
    }
}

async fn data_url(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read image attachment: {}", path.display()))?;
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    Ok(format!("data:{};base64,{}", mime.essence_str(), STANDARD.encode(bytes)))
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
