use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    pub state: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Latest observation from the nearest station, converted to US units where
/// a reading is present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub timestamp: String,
    pub temperature_f: Option<f64>,
    pub temperature_c: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed_mph: Option<f64>,
    pub wind_direction: Option<f64>,
    pub description: String,
}

/// A forecast period as returned upstream. Only `name` and
/// `detailedForecast` are read; every other field is carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPeriod {
    pub name: String,
    #[serde(rename = "detailedForecast")]
    pub detailed_forecast: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: Location,
    pub current_conditions: CurrentConditions,
    pub forecast: Vec<ForecastPeriod>,
}

/// The artifact written at the end of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub forecast_data: WeatherSnapshot,
    pub weather_report: String,
    pub color_code: Option<String>,
    pub timestamp: String,
}

/// An image handed to the language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Local(PathBuf),
    Remote(String),
}
