use thiserror::Error;

/// Failure of a pipeline stage. Every stage folds its own errors into exactly
/// one of these before handing control back to the driver.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Video {0} not found")]
    NotFound(String),

    #[error("Video {0} is not a livestream")]
    NotLive(String),

    #[error("Stream unavailable: {0}")]
    StreamUnavailable(String),

    #[error("Failed to store capture: {0}")]
    Capture(String),

    #[error("Weather data unavailable: {0}")]
    WeatherUnavailable(String),

    #[error("Report generation failed: {0}")]
    GenerationFailed(String),

    #[error(
        "Missing credential '{0}'.\n\
         Hint: run `lakecast configure` or set the matching environment variable."
    )]
    MissingCredential(&'static str),

    #[error("Failed to write report: {0}")]
    Write(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ReportError {
    /// Render an `anyhow` chain on one line, outermost context first.
    pub(crate) fn chain(err: &anyhow::Error) -> String {
        format!("{err:#}")
    }
}
