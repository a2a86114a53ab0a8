use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::ReportError,
    model::{GeoPoint, WeatherSnapshot},
};

pub mod nws;

pub use nws::NwsClient;

/// Number of forecast periods kept in a snapshot (current and next).
pub const FORECAST_PERIODS: usize = 2;

#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    /// Fetch a complete snapshot for `point`. Any failure along the way yields
    /// `ReportError::WeatherUnavailable`; a partial snapshot is never returned.
    async fn get_weather_data(&self, point: GeoPoint) -> Result<WeatherSnapshot, ReportError>;
}
