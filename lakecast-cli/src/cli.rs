use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::Password;
use lakecast_core::{Config, Pipeline, pipeline};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "lakecast", version, about = "Lakeside weather report generator")]
pub struct Cli {
    /// Read configuration from this file instead of the platform config directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Capture an image, fetch the weather, generate the report and write it (default).
    Run,

    /// Fetch the weather snapshot and print it as JSON.
    Weather,

    /// Fetch the weather and print the prompt a run would send to the model.
    Prompt,

    /// Store API credentials in the config file.
    Configure,

    /// Print the location of the config file.
    ConfigPath,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let Cli { config, command } = self;
        let config = config.as_deref();

        match command.unwrap_or(Command::Run) {
            Command::ConfigPath => {
                println!("{}", config_path(config)?.display());
            }
            Command::Configure => {
                let path = config_path(config)?;
                configure(&path)?;
            }
            Command::Run => {
                let config = load_config(config)?;
                let report = Pipeline::from_config(&config)?.run().await?;
                log::info!(
                    "Run complete: {} words, color {}",
                    report.weather_report.split_whitespace().count(),
                    report.color_code.as_deref().unwrap_or("none")
                );
            }
            Command::Weather => {
                let config = load_config(config)?;
                let snapshot = pipeline::fetch_snapshot(&config).await?;
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            Command::Prompt => {
                let config = load_config(config)?;
                println!("{}", pipeline::preview_prompt(&config).await?);
            }
        }

        Ok(())
    }
}

fn config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Config::config_file_path(),
    }
}

fn load_config(explicit: Option<&Path>) -> anyhow::Result<Config> {
    match explicit {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Prompt for each credential; an empty answer keeps the stored value.
fn configure(path: &Path) -> anyhow::Result<()> {
    let mut config = if path.exists() { Config::from_file(path)? } else { Config::default() };

    let youtube = Password::new("YouTube Data API key (empty to keep):")
        .without_confirmation()
        .prompt()
        .context("Failed to read YouTube API key")?;
    if !youtube.trim().is_empty() {
        config.set_youtube_api_key(youtube.trim().to_string());
    }

    let openai = Password::new("OpenAI API key (empty to keep):")
        .without_confirmation()
        .prompt()
        .context("Failed to read OpenAI API key")?;
    if !openai.trim().is_empty() {
        config.set_openai_api_key(openai.trim().to_string());
    }

    config.save_to(path)?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
