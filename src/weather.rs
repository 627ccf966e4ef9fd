//! # Marine Weather Fetching
//!
//! Current wave and wind readings for a coordinate, from an Open-Meteo
//! compatible marine forecast endpoint.
//!
//! ## Field Mapping
//! The marine endpoint reports swell but no wind, so the wind-wave fields
//! stand in for wind:
//!
//! | Upstream field | [`MarineWeather`] field |
//! |---|---|
//! | `wave_height` | `wave_height` |
//! | `wave_direction` | `wave_direction` |
//! | `wave_period` | `wave_period` |
//! | `wind_wave_height` | `wind_speed` |
//! | `wind_wave_direction` | `wind_direction` |
//!
//! Missing or null fields become 0. Only the `current` block is requested;
//! the score has no use for the hourly forecast.

use crate::config::WeatherConfig;
use crate::MarineWeather;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const CURRENT_FIELDS: &str =
    "wave_height,wave_direction,wave_period,wind_wave_height,wind_wave_direction";

/// Errors that can occur while fetching marine weather.
#[derive(Error, Debug)]
pub enum WeatherError {
    /// HTTP request failed (network, timeout, non-2xx status, or undecodable body)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response had no `current` block
    #[error("response missing current conditions")]
    MissingCurrent,
}

/// Source of current marine weather for a coordinate.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<MarineWeather, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct MarineResponse {
    current: Option<CurrentBlock>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CurrentBlock {
    wave_height: Option<f64>,
    wave_direction: Option<f64>,
    wave_period: Option<f64>,
    wind_wave_height: Option<f64>,
    wind_wave_direction: Option<f64>,
}

impl From<CurrentBlock> for MarineWeather {
    fn from(c: CurrentBlock) -> Self {
        MarineWeather {
            wave_height: c.wave_height.unwrap_or(0.0),
            wave_direction: c.wave_direction.unwrap_or(0.0),
            wave_period: c.wave_period.unwrap_or(0.0),
            wind_speed: c.wind_wave_height.unwrap_or(0.0),
            wind_direction: c.wind_wave_direction.unwrap_or(0.0),
        }
    }
}

/// Client for the Open-Meteo marine API.
#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(config: &WeatherConfig) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(OpenMeteoClient {
            client,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenMeteoClient {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<MarineWeather, WeatherError> {
        debug!(latitude, longitude, "fetching marine weather");

        let response: MarineResponse = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", latitude.to_string()),
                ("longitude", longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .current
            .map(MarineWeather::from)
            .ok_or(WeatherError::MissingCurrent)
    }
}
