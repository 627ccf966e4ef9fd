//! # Scoring Pipeline
//!
//! Runs one spot end to end: aggregate conditions, score them, narrate the
//! score, and return a [`ScoreResult`]. Each call is independent; the engine
//! holds only its collaborators and can be shared between tasks.

use crate::conditions::{ConditionsAggregator, FetchError};
use crate::config::Config;
use crate::narrative::Narrator;
use crate::scoring::{self, ScoreBand};
use crate::{llm, ConditionsRecord, ScoreResult, Spot};
use chrono::Utc;
use tracing::info;

#[derive(Clone)]
pub struct ScoreEngine {
    aggregator: ConditionsAggregator,
    narrator: Narrator,
}

impl ScoreEngine {
    pub fn new(aggregator: ConditionsAggregator, narrator: Narrator) -> Self {
        ScoreEngine {
            aggregator,
            narrator,
        }
    }

    /// Engine wired to the configured upstreams, cache and language model.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let narrator = Narrator::new(llm::from_config(&config.llm), config.llm.timeout());
        Ok(Self::new(ConditionsAggregator::from_config(config)?, narrator))
    }

    /// Engine that uses synthetic conditions and template narratives only.
    pub fn offline() -> Self {
        Self::new(ConditionsAggregator::offline(), Narrator::templated())
    }

    /// Score a spot. Never fails.
    pub async fn calculate(&self, spot: &Spot) -> ScoreResult {
        let conditions = self
            .aggregator
            .resolve(
                &spot.id,
                spot.latitude,
                spot.longitude,
                &spot.name,
                spot.difficulty,
            )
            .await;

        self.evaluate(conditions).await
    }

    /// Score and narrate an already assembled record.
    pub async fn evaluate(&self, conditions: ConditionsRecord) -> ScoreResult {
        let score = scoring::score(&conditions);
        let narrative = self.narrator.narrate(&conditions, score).await;

        info!(
            spot = %conditions.spot_name,
            score,
            offline = conditions.offline,
            "spot scored"
        );

        ScoreResult {
            score,
            band: ScoreBand::from_score(score),
            summary: narrative.summary,
            recommendation: narrative.recommendation,
            factors: conditions,
            computed_at: Utc::now(),
        }
    }
}
