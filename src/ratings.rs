//! Community ratings for spots.
//!
//! A missing rating is a normal outcome (`Ok(None)`), not an error; only a
//! provider that cannot answer at all returns `Err`.

use async_trait::async_trait;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::warn;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Error, Debug)]
pub enum RatingsError {
    #[error("ratings service unavailable: {0}")]
    Unavailable(String),
}

/// Source of 1-5 community ratings keyed by spot id.
#[async_trait]
pub trait RatingsProvider: Send + Sync {
    async fn rating(&self, spot_id: &str) -> Result<Option<u8>, RatingsError>;
}

/// Provider for deployments without a ratings service.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRatings;

#[async_trait]
impl RatingsProvider for NoRatings {
    async fn rating(&self, _spot_id: &str) -> Result<Option<u8>, RatingsError> {
        Ok(None)
    }
}

/// Ratings from a fixed table, e.g. the `[ratings]` section of the config.
///
/// Entries outside 1-5 are dropped when the table is built.
#[derive(Debug, Clone, Default)]
pub struct StaticRatings {
    ratings: BTreeMap<String, u8>,
}

impl StaticRatings {
    pub fn new(table: &BTreeMap<String, u8>) -> Self {
        let ratings = table
            .iter()
            .filter(|(spot_id, &rating)| {
                let valid = (MIN_RATING..=MAX_RATING).contains(&rating);
                if !valid {
                    warn!(spot_id = %spot_id, rating, "ignoring rating outside 1-5");
                }
                valid
            })
            .map(|(k, &v)| (k.clone(), v))
            .collect();
        StaticRatings { ratings }
    }
}

#[async_trait]
impl RatingsProvider for StaticRatings {
    async fn rating(&self, spot_id: &str) -> Result<Option<u8>, RatingsError> {
        Ok(self.ratings.get(spot_id).copied())
    }
}
