use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{model::GeoPoint, source::SourceKind};

pub const YOUTUBE_API_KEY_ENV: &str = "YOUTUBE_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Monitored point and the zone its local times are reported in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// IANA zone name, e.g. "America/Chicago".
    pub timezone: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            name: "Evanston, Illinois".to_string(),
            latitude: 42.032931,
            longitude: -87.680432,
            timezone: "America/Chicago".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// One of "thumbnail", "frame" or "camera".
    pub kind: String,
    pub video_id: String,
    pub camera_urls: Vec<String>,
    pub youtube_api_base: String,
    pub resolver_program: String,
    pub ffmpeg_program: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::Thumbnail.to_string(),
            video_id: "XP3Gle-S9lE".to_string(),
            camera_urls: Vec::new(),
            youtube_api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            resolver_program: "yt-dlp".to_string(),
            ffmpeg_program: "ffmpeg".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub base_url: String,
    /// weather.gov rejects requests without an identifying User-Agent.
    pub user_agent: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.weather.gov".to_string(),
            user_agent: "(lakecast, lakecast@example.com)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub base_url: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub report_path: PathBuf,
    pub capture_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_path: PathBuf::from("weather_report.json"),
            capture_dir: PathBuf::from("captures"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Credentials {
    pub youtube_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

/// Interchangeable wording parameters for the report prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub persona: String,
    pub scene: String,
    pub word_limit: u32,
    pub wind_words: Vec<String>,
    pub humidity_words: Vec<String>,
    /// Replaces the built-in template entirely when set.
    pub template: Option<String>,
}

impl Default for StyleConfig {
    fn default() -> Self {
        let words = |list: &[&str]| -> Vec<String> { list.iter().map(|w| w.to_string()).collect() };
        Self {
            persona: "a veteran Chicago news anchor with a meteorologist's precision and \
                      an oral historian's ear for ordinary life"
                .to_string(),
            scene: "a view of the beach looking east from a parks department building \
                    towards Lake Michigan"
                .to_string(),
            word_limit: 500,
            wind_words: words(&[
                "still", "calm", "whispering", "gentle", "light", "breezy", "blustery",
                "gusty", "howling", "fierce", "wild", "gale",
            ]),
            humidity_words: words(&[
                "crisp and cool",
                "pleasantly dry",
                "perfectly comfortable",
                "ideal",
                "slightly muggy",
                "sticky",
                "uncomfortably humid",
            ]),
            template: None,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// [location]
/// latitude = 42.032931
/// longitude = -87.680432
///
/// [credentials]
/// openai_api_key = "..."
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub location: LocationConfig,
    pub source: SourceConfig,
    pub weather: WeatherConfig,
    pub model: ModelConfig,
    pub output: OutputConfig,
    pub credentials: Credentials,
    pub style: StyleConfig,
}

impl Config {
    /// Load config from the platform location, or defaults if it doesn't exist yet.
    /// Environment credentials are applied on top.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        let mut cfg = if path.exists() { Self::from_file(&path)? } else { Self::default() };
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Load config from an explicit file. Environment credentials are applied on top.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut cfg = Self::from_file(path)?;
        cfg.apply_env(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Parse and validate a config file without applying environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        cfg.timezone()?;
        SourceKind::try_from(cfg.source.kind.as_str())?;

        Ok(cfg)
    }

    /// Override stored credentials with non-empty values from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = pick(YOUTUBE_API_KEY_ENV) {
            self.credentials.youtube_api_key = Some(key);
        }
        if let Some(key) = pick(OPENAI_API_KEY_ENV) {
            self.credentials.openai_api_key = Some(key);
        }
    }

    /// Save config to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "lakecast", "lakecast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint { latitude: self.location.latitude, longitude: self.location.longitude }
    }

    pub fn timezone(&self) -> Result<Tz> {
        self.location
            .timezone
            .parse::<Tz>()
            .map_err(|e| anyhow!("Invalid timezone '{}': {e}", self.location.timezone))
    }

    pub fn source_kind(&self) -> Result<SourceKind> {
        SourceKind::try_from(self.source.kind.as_str())
    }

    pub fn set_youtube_api_key(&mut self, key: String) {
        self.credentials.youtube_api_key = Some(key);
    }

    pub fn set_openai_api_key(&mut self, key: String) {
        self.credentials.openai_api_key = Some(key);
    }

    pub fn youtube_api_key(&self) -> Option<&str> {
        self.credentials.youtube_api_key.as_deref().filter(|k| !k.is_empty())
    }

    pub fn openai_api_key(&self) -> Option<&str> {
        self.credentials.openai_api_key.as_deref().filter(|k| !k.is_empty())
    }
}
