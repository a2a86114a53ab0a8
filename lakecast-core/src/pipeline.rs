//! One run: image → weather → prompt → report → file.
//!
//! Stages run strictly in order and the first failure aborts the run; nothing
//! is written unless every stage succeeds.

use crate::{
    Config,
    error::ReportError,
    imagery::ImageSource,
    llm::OpenAiChatModel,
    model::{GeoPoint, Report, WeatherSnapshot},
    prompt::ReportComposer,
    report::ReportGenerator,
    source::image_source_from_config,
    weather::{NwsClient, WeatherSource},
    writer::ResultWriter,
};

#[derive(Debug)]
pub struct Pipeline {
    point: GeoPoint,
    images: Box<dyn ImageSource>,
    weather: Box<dyn WeatherSource>,
    composer: ReportComposer,
    generator: ReportGenerator,
    writer: ResultWriter,
}

impl Pipeline {
    pub fn new(
        point: GeoPoint,
        images: Box<dyn ImageSource>,
        weather: Box<dyn WeatherSource>,
        composer: ReportComposer,
        generator: ReportGenerator,
        writer: ResultWriter,
    ) -> Self {
        Self { point, images, weather, composer, generator, writer }
    }

    /// Wire up the production components described by `config`.
    pub fn from_config(config: &Config) -> Result<Self, ReportError> {
        let composer = ReportComposer::from_config(config)
            .map_err(|e| ReportError::Config(ReportError::chain(&e)))?;
        let model = OpenAiChatModel::from_config(config)?;
        let images = image_source_from_config(config)?;

        Ok(Self::new(
            config.point(),
            images,
            Box::new(weather_client(config)?),
            composer.clone(),
            ReportGenerator::new(Box::new(model), composer.timezone()),
            ResultWriter::new(&config.output.report_path),
        ))
    }

    pub async fn run(&self) -> Result<Report, ReportError> {
        let images = self.images.acquire().await?;
        if images.is_empty() {
            log::warn!("Image source returned no images; reporting from forecast only");
        }

        let snapshot = self.weather.get_weather_data(self.point).await?;
        let prompt = self.composer.compose(&snapshot);
        let report = self.generator.generate(&prompt, &images, snapshot).await?;
        self.writer.write(&report).await?;

        Ok(report)
    }
}

pub fn weather_client(config: &Config) -> Result<NwsClient, ReportError> {
    NwsClient::new(&config.weather.base_url, &config.weather.user_agent)
        .map_err(|e| ReportError::Config(ReportError::chain(&e)))
}

/// Fetch the snapshot alone, without images or the model.
pub async fn fetch_snapshot(config: &Config) -> Result<WeatherSnapshot, ReportError> {
    weather_client(config)?.get_weather_data(config.point()).await
}

/// Fetch the snapshot and render the prompt that a run would send.
pub async fn preview_prompt(config: &Config) -> Result<String, ReportError> {
    let composer = ReportComposer::from_config(config)
        .map_err(|e| ReportError::Config(ReportError::chain(&e)))?;
    let snapshot = fetch_snapshot(config).await?;
    Ok(composer.compose(&snapshot))
}
