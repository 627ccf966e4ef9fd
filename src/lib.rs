//! # Surf Score Core Library
//!
//! This library turns raw marine observations into a single 0-100 surf quality
//! score for a spot, plus a short human-readable summary and recommendation.
//!
//! ## Data Flow
//!
//! 1. **Aggregate**: fetch marine weather and tide data for the spot's coordinates,
//!    resolve the current tide height and phase, look up a user rating
//!    ([`conditions`], [`tide_phase`])
//! 2. **Score**: apply the additive weighted rules to the conditions ([`scoring`])
//! 3. **Narrate**: ask a language model for a summary, or fall back to score-banded
//!    templates ([`narrative`])
//! 4. **Return**: hand the [`ScoreResult`] to the caller for display or caching
//!
//! ## Offline Behavior
//!
//! No upstream failure ever reaches the caller. When weather or tide sources are
//! unreachable the aggregator substitutes synthetic data from [`fallback`] and marks
//! the record `offline`, mirroring how a tide chart falls back to a model curve.
//!
//! ## Core Types
//!
//! - [`ConditionsRecord`]: unified snapshot of wave, wind and tide data for one spot
//! - [`TideSeries`]: tide extremes plus sampled heights as returned by a tide provider
//! - [`ScoreResult`]: the score, its narrative and the conditions it was computed from

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod cache;
pub mod conditions;
pub mod config;
pub mod engine;
pub mod fallback;
pub mod llm;
pub mod logging;
pub mod narrative;
pub mod ratings;
pub mod renderer;
pub mod scoring;
pub mod tide_data;
pub mod tide_phase;
pub mod weather;

use scoring::ScoreBand;

/// Qualitative tide state at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TidePhase {
    Rising,
    Falling,
    High,
    Low,
}

impl TidePhase {
    pub const ALL: [TidePhase; 4] = [
        TidePhase::Rising,
        TidePhase::Falling,
        TidePhase::High,
        TidePhase::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TidePhase::Rising => "rising",
            TidePhase::Falling => "falling",
            TidePhase::High => "high",
            TidePhase::Low => "low",
        }
    }
}

impl fmt::Display for TidePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Skill level a spot is suited to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
            Difficulty::Expert => "expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a difficulty label is not one of the four known levels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty '{0}' (expected beginner, intermediate, advanced or expert)")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            "expert" => Ok(Difficulty::Expert),
            _ => Err(UnknownDifficulty(s.to_string())),
        }
    }
}

/// Label on a tide extreme.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideKind {
    High,
    Low,
}

/// A single tide height reading.
///
/// Field names on the wire follow the WorldTides v3 `heights` array
/// (`dt` in Unix seconds, `height` in meters), so provider payloads
/// deserialize directly.
///
/// # Example
/// ```
/// use surf_score_lib::TideSample;
///
/// let sample: TideSample = serde_json::from_str(r#"{"dt": 1700000000, "height": 1.42}"#).unwrap();
/// assert_eq!(sample.timestamp, 1_700_000_000);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideSample {
    /// Unix timestamp in seconds
    #[serde(rename = "dt")]
    pub timestamp: i64,
    /// Height in meters
    #[serde(rename = "height")]
    pub height_m: f64,
}

/// A labeled local maximum or minimum of the tide curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideExtreme {
    /// Unix timestamp in seconds
    #[serde(rename = "dt")]
    pub timestamp: i64,
    /// Height in meters
    #[serde(rename = "height")]
    pub height_m: f64,
    #[serde(rename = "type")]
    pub kind: TideKind,
}

/// Tide payload for one location: labeled extremes plus regularly sampled heights.
///
/// Extremes are expected in chronological order. When `offline = true` the data
/// was produced by the synthetic model in [`fallback`] rather than a tide service.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TideSeries {
    #[serde(default)]
    pub extremes: Vec<TideExtreme>,
    #[serde(default)]
    pub heights: Vec<TideSample>,
    #[serde(default)]
    pub offline: bool,
}

/// Current marine weather at a coordinate.
///
/// Units: meters, seconds, m/s and compass degrees. Fields the upstream
/// did not report are 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarineWeather {
    pub wave_height: f64,
    pub wave_direction: f64,
    pub wave_period: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
}

/// Unified snapshot of surf conditions for one spot.
///
/// Every numeric field is finite; values an upstream did not provide are 0.
/// `user_rating` is the only genuinely optional input and is left out of the
/// score when absent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionsRecord {
    /// Significant wave height in meters
    pub wave_height: f64,
    /// Direction waves come from, degrees in [0, 360)
    pub wave_direction: f64,
    /// Wave period in seconds
    pub wave_period: f64,
    /// Current tide height in meters
    pub tide_height: f64,
    pub tide_phase: TidePhase,
    /// Wind speed in m/s
    pub wind_speed: f64,
    /// Direction wind comes from, degrees in [0, 360)
    pub wind_direction: f64,
    /// Community rating on a 1-5 scale
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rating: Option<u8>,
    pub spot_name: String,
    pub difficulty: Difficulty,
    /// True when the record was synthesized because upstream data was unavailable
    #[serde(default)]
    pub offline: bool,
}

/// A surf spot the caller wants scored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spot {
    pub id: String,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub difficulty: Difficulty,
}

/// Output of the scoring pipeline, handed to the caller for display or persistence.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    /// Surf quality in [0, 100]
    pub score: u8,
    pub band: ScoreBand,
    pub summary: String,
    pub recommendation: String,
    /// Conditions the score was computed from
    pub factors: ConditionsRecord,
    pub computed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_parses_case_insensitively() {
        assert_eq!("Expert".parse::<Difficulty>(), Ok(Difficulty::Expert));
        assert_eq!(" beginner ".parse::<Difficulty>(), Ok(Difficulty::Beginner));
        assert_eq!(
            "pro".parse::<Difficulty>(),
            Err(UnknownDifficulty("pro".to_string()))
        );
    }

    #[test]
    fn conditions_use_camel_case_on_the_wire() {
        let json = r#"{
            "waveHeight": 1.2, "waveDirection": 180, "wavePeriod": 11,
            "tideHeight": 0.9, "tidePhase": "falling",
            "windSpeed": 6, "windDirection": 45,
            "spotName": "Rincon", "difficulty": "advanced"
        }"#;
        let c: ConditionsRecord = serde_json::from_str(json).unwrap();
        assert_eq!(c.tide_phase, TidePhase::Falling);
        assert_eq!(c.user_rating, None);
        assert!(!c.offline);

        let back = serde_json::to_value(&c).unwrap();
        assert!(back.get("userRating").is_none());
        assert_eq!(back["spotName"], "Rincon");
    }

    #[test]
    fn tide_extreme_reads_worldtides_fields() {
        let e: TideExtreme =
            serde_json::from_str(r#"{"dt": 1700000000, "height": 1.7, "type": "High"}"#).unwrap();
        assert_eq!(e.kind, TideKind::High);
        assert_eq!(e.height_m, 1.7);
    }
}
