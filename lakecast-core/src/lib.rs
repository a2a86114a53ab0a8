//! Core library for the `lakecast` report generator.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Image sources for the monitored location
//! - The weather.gov client and unit conversions
//! - Prompt composition, the model client and report post-processing
//! - The JSON result writer and the pipeline that ties them together
//!
//! It is used by `lakecast-cli`, but the pipeline pieces can be driven directly.

pub mod config;
pub mod error;
pub mod imagery;
pub mod llm;
pub mod model;
pub mod pipeline;
pub mod prompt;
pub mod report;
pub mod source;
pub mod units;
pub mod weather;
pub mod writer;

pub use config::Config;
pub use error::ReportError;
pub use model::{CurrentConditions, ForecastPeriod, GeoPoint, ImageRef, Report, WeatherSnapshot};
pub use pipeline::Pipeline;
pub use source::SourceKind;

/// Shorten an upstream error body for inclusion in an error message.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_are_kept() {
        assert_eq!(truncate_body("not found"), "not found");
    }

    #[test]
    fn long_bodies_are_cut_on_a_char_boundary() {
        let body = "é".repeat(150);
        let cut = truncate_body(&body);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.len(), 200 + 3);
    }
}
