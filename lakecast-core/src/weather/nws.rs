//! Client for the US National Weather Service API (api.weather.gov).
//!
//! - `/points/{lat},{lon}` gives the forecast URL, the observation stations
//!   URL and the nearest named place.
//! - The stations list is ordered by distance; the first entry is used.
//! - `{station}/observations/latest` gives the current readings.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::{
    Client,
    header::{ACCEPT, HeaderMap, HeaderValue},
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    error::ReportError,
    model::{CurrentConditions, ForecastPeriod, GeoPoint, Location, WeatherSnapshot},
    units::{celsius_to_fahrenheit, meters_per_second_to_mph},
};

use super::{FORECAST_PERIODS, WeatherSource};

const HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct NwsClient {
    base_url: String,
    http: Client,
}

impl NwsClient {
    pub fn new(base_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/geo+json"));

        let http = Client::builder()
            .user_agent(user_agent)
            .default_headers(headers)
            .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("Failed to build weather.gov HTTP client")?;

        Ok(Self { base_url: base_url.into().trim_end_matches('/').to_string(), http })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        log::debug!("weather.gov {what} request: {url}");

        let res = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to send request to weather.gov ({what})"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read weather.gov {what} response body"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "weather.gov {} request failed with status {}: {}",
                what,
                status,
                crate::truncate_body(&body),
            ));
        }

        serde_json::from_str(&body)
            .with_context(|| format!("Failed to parse weather.gov {what} JSON"))
    }

    async fn fetch_point(&self, point: GeoPoint) -> Result<PointProperties> {
        let url = format!("{}/points/{:.4},{:.4}", self.base_url, point.latitude, point.longitude);
        let parsed: PointResponse = self.get_json(&url, "points").await?;
        Ok(parsed.properties)
    }

    async fn fetch_forecast(&self, url: &str) -> Result<Vec<ForecastPeriod>> {
        let parsed: ForecastResponse = self.get_json(url, "forecast").await?;
        Ok(parsed.properties.periods.into_iter().take(FORECAST_PERIODS).collect())
    }

    async fn fetch_latest_observation(&self, stations_url: &str) -> Result<ObservationProperties> {
        let stations: StationsResponse = self.get_json(stations_url, "stations").await?;

        let nearest = stations
            .features
            .first()
            .ok_or_else(|| anyhow!("weather.gov returned no observation stations"))?;

        let url = format!("{}/observations/latest", nearest.id.trim_end_matches('/'));
        let parsed: ObservationResponse = self.get_json(&url, "observation").await?;
        Ok(parsed.properties)
    }

    async fn fetch_snapshot(&self, point: GeoPoint) -> Result<WeatherSnapshot> {
        let props = self.fetch_point(point).await?;
        let forecast = self.fetch_forecast(&props.forecast).await?;
        let observation = self.fetch_latest_observation(&props.observation_stations).await?;

        let place = props.relative_location.properties;

        Ok(WeatherSnapshot {
            location: Location {
                name: place.city,
                state: place.state,
                latitude: point.latitude,
                longitude: point.longitude,
            },
            current_conditions: observation.into_conditions(),
            forecast,
        })
    }
}

#[async_trait]
impl WeatherSource for NwsClient {
    async fn get_weather_data(&self, point: GeoPoint) -> Result<WeatherSnapshot, ReportError> {
        log::info!("Fetching weather for ({:.4}, {:.4})", point.latitude, point.longitude);

        let snapshot = self.fetch_snapshot(point).await.map_err(|e| {
            let msg = ReportError::chain(&e);
            log::error!("Error getting weather data: {msg}");
            ReportError::WeatherUnavailable(msg)
        })?;

        log::info!(
            "Weather for {}, {}: {} ({} forecast periods)",
            snapshot.location.name,
            snapshot.location.state,
            snapshot.current_conditions.description,
            snapshot.forecast.len()
        );
        Ok(snapshot)
    }
}

#[derive(Debug, Deserialize)]
struct PointResponse {
    properties: PointProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PointProperties {
    forecast: String,
    observation_stations: String,
    relative_location: RelativeLocation,
}

#[derive(Debug, Deserialize)]
struct RelativeLocation {
    properties: Place,
}

#[derive(Debug, Deserialize)]
struct Place {
    city: String,
    state: String,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: ForecastProperties,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    periods: Vec<ForecastPeriod>,
}

#[derive(Debug, Deserialize)]
struct StationsResponse {
    features: Vec<StationFeature>,
}

#[derive(Debug, Deserialize)]
struct StationFeature {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ObservationResponse {
    properties: ObservationProperties,
}

/// A reading whose value is null when the station didn't report it.
#[derive(Debug, Deserialize)]
struct Quantity {
    #[serde(default)]
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObservationProperties {
    timestamp: String,
    temperature: Quantity,
    relative_humidity: Quantity,
    wind_speed: Quantity,
    wind_direction: Quantity,
    #[serde(default)]
    text_description: Option<String>,
}

impl ObservationProperties {
    fn into_conditions(self) -> CurrentConditions {
        CurrentConditions {
            timestamp: self.timestamp,
            temperature_f: celsius_to_fahrenheit(self.temperature.value),
            temperature_c: self.temperature.value,
            humidity: self.relative_humidity.value,
            wind_speed_mph: meters_per_second_to_mph(self.wind_speed.value),
            wind_direction: self.wind_direction.value,
            description: self.text_description.unwrap_or_default(),
        }
    }
}
