//! # Conditions Aggregation
//!
//! Gathers marine weather, tide data and a community rating for a spot and
//! assembles them into one [`ConditionsRecord`].
//!
//! ## Pipeline
//!
//! 1. Weather and tides are requested concurrently, each under its own timeout
//!    and each served from the [`Cache`] when a live entry exists
//! 2. The tide payload goes through [`tide_phase::resolve_series`] at the current time
//! 3. The ratings provider is asked for the spot's rating (absence is normal)
//! 4. The record is assembled; fields upstream did not report are already 0
//!
//! [`ConditionsAggregator::fetch`] reports upstream problems as [`FetchError`].
//! [`ConditionsAggregator::resolve`] is the never-failing entry point: any error
//! is logged and replaced by synthetic conditions from [`fallback`].

use crate::cache::{self, Cache};
use crate::config::Config;
use crate::ratings::{NoRatings, RatingsError, RatingsProvider, StaticRatings};
use crate::tide_data::{self, TideError, TideProvider};
use crate::weather::{OpenMeteoClient, WeatherError, WeatherProvider};
use crate::{fallback, tide_phase, ConditionsRecord, Difficulty, MarineWeather, TideSeries};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Why upstream conditions could not be assembled.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("weather: {0}")]
    Weather(#[from] WeatherError),

    #[error("tides: {0}")]
    Tide(#[from] TideError),

    #[error("ratings: {0}")]
    Ratings(#[from] RatingsError),

    #[error("{0} request timed out after {1:?}")]
    Timeout(&'static str, Duration),
}

/// Timeouts and cache lifetimes for upstream calls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchSettings {
    pub weather_timeout: Duration,
    pub tide_timeout: Duration,
    pub ratings_timeout: Duration,
    pub weather_ttl: Duration,
    pub tide_ttl: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            weather_timeout: Duration::from_secs(5),
            tide_timeout: Duration::from_secs(5),
            ratings_timeout: Duration::from_secs(5),
            weather_ttl: Duration::from_secs(1800),
            tide_ttl: Duration::from_secs(3600),
        }
    }
}

impl FetchSettings {
    pub fn from_config(config: &Config) -> Self {
        FetchSettings {
            weather_timeout: config.weather.timeout(),
            tide_timeout: config.tides.timeout(),
            weather_ttl: Duration::from_secs(config.weather.cache_ttl_secs),
            tide_ttl: Duration::from_secs(config.tides.cache_ttl_secs),
            ..FetchSettings::default()
        }
    }
}

/// The network collaborators an online aggregator talks to.
#[derive(Clone)]
pub struct Upstream {
    pub weather: Arc<dyn WeatherProvider>,
    pub tides: Arc<dyn TideProvider>,
    pub ratings: Arc<dyn RatingsProvider>,
}

/// Cache key for an upstream payload at a coordinate.
pub fn cache_key(source: &str, latitude: f64, longitude: f64) -> String {
    format!("{source}_{latitude}_{longitude}")
}

/// Assembles [`ConditionsRecord`]s from upstream providers.
#[derive(Clone)]
pub struct ConditionsAggregator {
    upstream: Option<Upstream>,
    cache: Option<Arc<dyn Cache>>,
    settings: FetchSettings,
}

impl ConditionsAggregator {
    pub fn new(upstream: Upstream, cache: Option<Arc<dyn Cache>>, settings: FetchSettings) -> Self {
        ConditionsAggregator {
            upstream: Some(upstream),
            cache,
            settings,
        }
    }

    /// Aggregator that never touches the network and always synthesizes conditions.
    pub fn offline() -> Self {
        ConditionsAggregator {
            upstream: None,
            cache: None,
            settings: FetchSettings::default(),
        }
    }

    /// Build the configured providers and cache.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let ratings: Arc<dyn RatingsProvider> = if config.ratings.is_empty() {
            Arc::new(NoRatings)
        } else {
            Arc::new(StaticRatings::new(&config.ratings))
        };

        let upstream = Upstream {
            weather: Arc::new(OpenMeteoClient::new(&config.weather)?),
            tides: tide_data::from_config(&config.tides)?,
            ratings,
        };

        Ok(Self::new(
            upstream,
            cache::from_config(&config.cache),
            FetchSettings::from_config(config),
        ))
    }

    pub fn is_offline(&self) -> bool {
        self.upstream.is_none()
    }

    /// Conditions for a spot. Never fails; upstream problems yield synthetic data.
    pub async fn resolve(
        &self,
        spot_id: &str,
        latitude: f64,
        longitude: f64,
        spot_name: &str,
        difficulty: Difficulty,
    ) -> ConditionsRecord {
        let Some(upstream) = &self.upstream else {
            debug!(spot_id, "offline mode, synthesizing conditions");
            return fallback::conditions(spot_name, difficulty);
        };

        match self
            .fetch(upstream, spot_id, latitude, longitude, spot_name, difficulty)
            .await
        {
            Ok(conditions) => conditions,
            Err(e) => {
                warn!(spot_id, error = %e, "upstream data unavailable, using synthetic conditions");
                fallback::conditions(spot_name, difficulty)
            }
        }
    }

    /// Conditions assembled strictly from upstream data.
    ///
    /// The record is marked `offline` only when the tide provider served
    /// synthetic tides.
    pub async fn fetch(
        &self,
        upstream: &Upstream,
        spot_id: &str,
        latitude: f64,
        longitude: f64,
        spot_name: &str,
        difficulty: Difficulty,
    ) -> Result<ConditionsRecord, FetchError> {
        let (weather, tides) = tokio::join!(
            self.weather(upstream, latitude, longitude),
            self.tides(upstream, spot_id, latitude, longitude),
        );
        let weather = weather?;
        let tides = tides?;

        let reading = tide_phase::resolve_series(&tides, Utc::now().timestamp());
        let user_rating = bounded(
            "ratings",
            self.settings.ratings_timeout,
            upstream.ratings.rating(spot_id),
        )
        .await??;

        info!(
            spot_id,
            wave_height = weather.wave_height,
            tide_phase = %reading.phase,
            rated = user_rating.is_some(),
            "conditions assembled"
        );

        Ok(ConditionsRecord {
            wave_height: weather.wave_height,
            wave_direction: weather.wave_direction,
            wave_period: weather.wave_period,
            tide_height: reading.height_m,
            tide_phase: reading.phase,
            wind_speed: weather.wind_speed,
            wind_direction: weather.wind_direction,
            user_rating,
            spot_name: spot_name.to_string(),
            difficulty,
            offline: tides.offline,
        })
    }

    async fn weather(
        &self,
        upstream: &Upstream,
        latitude: f64,
        longitude: f64,
    ) -> Result<MarineWeather, FetchError> {
        let key = cache_key("weather", latitude, longitude);
        if let Some(weather) = self.cached(&key) {
            return Ok(weather);
        }

        let weather = bounded(
            "weather",
            self.settings.weather_timeout,
            upstream.weather.current(latitude, longitude),
        )
        .await??;

        self.remember(&key, &weather, self.settings.weather_ttl);
        Ok(weather)
    }

    async fn tides(
        &self,
        upstream: &Upstream,
        spot_id: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<TideSeries, FetchError> {
        let key = cache_key("tide", latitude, longitude);
        if let Some(series) = self.cached(&key) {
            return Ok(series);
        }

        let series = bounded(
            "tide",
            self.settings.tide_timeout,
            upstream.tides.tides(latitude, longitude, Some(spot_id)),
        )
        .await??;

        // Synthetic tides are regenerated per request.
        if !series.offline {
            self.remember(&key, &series, self.settings.tide_ttl);
        }
        Ok(series)
    }

    fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.cache.as_deref().and_then(|c| cache::load(c, key))
    }

    fn remember<T: Serialize>(&self, key: &str, data: &T, ttl: Duration) {
        if let Some(c) = self.cache.as_deref() {
            cache::store(c, key, data, ttl);
        }
    }
}

/// Run `call` under `limit`, reporting expiry as [`FetchError::Timeout`].
async fn bounded<F: Future>(
    source: &'static str,
    limit: Duration,
    call: F,
) -> Result<F::Output, FetchError> {
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| FetchError::Timeout(source, limit))
}
