use std::sync::LazyLock;

use chrono_tz::Tz;
use regex::Regex;

use crate::{
    error::ReportError,
    llm::LanguageModel,
    model::{ImageRef, Report, WeatherSnapshot},
    prompt::{format_local_time, local_now},
};

static COLOR_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(?:[0-9a-fA-F]{3}){1,2}\b").expect("color pattern is valid"));

/// First `#rgb` / `#rrggbb` code in `text`, if any.
pub fn extract_color_code(text: &str) -> Option<&str> {
    COLOR_CODE.find(text).map(|m| m.as_str())
}

/// Split raw model output into prose and color code. The matched code is
/// cut out at its position and trailing whitespace trimmed.
pub fn split_report(raw: &str) -> (String, Option<String>) {
    match COLOR_CODE.find(raw) {
        Some(m) => {
            let mut prose = raw.to_string();
            prose.replace_range(m.range(), "");
            (prose.trim_end().to_string(), Some(m.as_str().to_string()))
        }
        None => (raw.trim_end().to_string(), None),
    }
}

pub fn assemble_report(snapshot: WeatherSnapshot, raw: &str, timestamp: String) -> Report {
    let (weather_report, color_code) = split_report(raw);
    Report { forecast_data: snapshot, weather_report, color_code, timestamp }
}

/// Drives one model call and turns its answer into a [`Report`].
#[derive(Debug)]
pub struct ReportGenerator {
    model: Box<dyn LanguageModel>,
    tz: Tz,
}

impl ReportGenerator {
    pub fn new(model: Box<dyn LanguageModel>, tz: Tz) -> Self {
        Self { model, tz }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        images: &[ImageRef],
        snapshot: WeatherSnapshot,
    ) -> Result<Report, ReportError> {
        log::info!("Requesting weather report ({} image(s))", images.len());

        let raw = self.model.prompt(prompt, images).await.map_err(|e| {
            let msg = ReportError::chain(&e);
            log::error!("Error generating report: {msg}");
            ReportError::GenerationFailed(msg)
        })?;

        let report = assemble_report(snapshot, &raw, format_local_time(&local_now(self.tz)));

        match &report.color_code {
            Some(code) => log::info!("Report generated with color {code}"),
            None => log::warn!("Report generated without a color code"),
        }
        Ok(report)
    }
}
