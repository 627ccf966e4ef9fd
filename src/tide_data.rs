//! # Tide Data Fetching
//!
//! This module supplies tide extremes and sampled heights for a coordinate.
//!
//! ## Data Sources
//!
//! ### WorldTides v3
//! - **URL**: https://www.worldtides.info/api/v3
//! - **Request**: `extremes`, `heights`, `lat`, `lon`, `key`, `start`, `length`
//! - **Window**: 3 days from now by default
//! - **Format**: JSON with `extremes` (`dt`, `height`, `type`) and `heights`
//!   (`dt`, `height`) arrays, which deserialize straight into [`TideSeries`]
//!
//! ### Synthetic model
//! Without an API key, [`SyntheticTides`] serves the semidiurnal model from
//! [`crate::fallback`] so the pipeline still has a realistic curve to work with.
//!
//! ## Error Handling
//!
//! - **Network timeouts / transport errors**: reported as [`TideError::Http`]
//! - **HTTP 429**: reported as [`TideError::RateLimited`]
//! - **`error` field in the body**: reported as [`TideError::Api`]
//! - **Missing arrays**: treated as empty, left for the resolver to handle

use crate::config::TideConfig;
use crate::{fallback, TideExtreme, TideSample, TideSeries};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during tide data fetching.
#[derive(Error, Debug)]
pub enum TideError {
    /// HTTP request failed (network, server, or protocol error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("tide API rate limit exceeded")]
    RateLimited,

    /// The service answered but reported an error
    #[error("WorldTides API error: {0}")]
    Api(String),
}

/// Source of tide extremes and heights for a coordinate.
#[async_trait]
pub trait TideProvider: Send + Sync {
    async fn tides(
        &self,
        latitude: f64,
        longitude: f64,
        spot_id: Option<&str>,
    ) -> Result<TideSeries, TideError>;
}

#[derive(Debug, Deserialize)]
struct WorldTidesResponse {
    error: Option<String>,
    #[serde(default)]
    extremes: Vec<TideExtreme>,
    #[serde(default)]
    heights: Vec<TideSample>,
}

/// Client for the WorldTides v3 API.
#[derive(Debug, Clone)]
pub struct WorldTidesClient {
    client: Client,
    base_url: String,
    api_key: String,
    length_secs: u64,
}

impl WorldTidesClient {
    pub fn new(config: &TideConfig, api_key: &str) -> Result<Self, TideError> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        Ok(WorldTidesClient {
            client,
            base_url: config.base_url.clone(),
            api_key: api_key.to_string(),
            length_secs: config.length_secs,
        })
    }
}

#[async_trait]
impl TideProvider for WorldTidesClient {
    async fn tides(
        &self,
        latitude: f64,
        longitude: f64,
        spot_id: Option<&str>,
    ) -> Result<TideSeries, TideError> {
        debug!(
            latitude,
            longitude,
            spot_id = spot_id.unwrap_or("-"),
            "fetching tide data from WorldTides"
        );

        let start = Utc::now().timestamp();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("extremes", "true".to_string()),
                ("heights", "true".to_string()),
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("key", self.api_key.clone()),
                ("start", start.to_string()),
                ("length", self.length_secs.to_string()),
            ])
            .send()
            .await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            return Err(TideError::RateLimited);
        }

        let body: WorldTidesResponse = response.error_for_status()?.json().await?;
        if let Some(message) = body.error {
            return Err(TideError::Api(message));
        }

        Ok(TideSeries {
            extremes: body.extremes,
            heights: body.heights,
            offline: false,
        })
    }
}

/// Tide provider backed by the synthetic model.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticTides;

#[async_trait]
impl TideProvider for SyntheticTides {
    async fn tides(
        &self,
        _latitude: f64,
        _longitude: f64,
        _spot_id: Option<&str>,
    ) -> Result<TideSeries, TideError> {
        Ok(fallback::approximate(None))
    }
}

/// WorldTides when a usable API key is configured, otherwise the synthetic model.
pub fn from_config(config: &TideConfig) -> Result<Arc<dyn TideProvider>, TideError> {
    match config.usable_api_key() {
        Some(key) => Ok(Arc::new(WorldTidesClient::new(config, key)?)),
        None => {
            info!("no tide API key configured, using synthetic tide data");
            Ok(Arc::new(SyntheticTides))
        }
    }
}
