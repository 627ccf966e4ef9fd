//! # Surf Quality Scoring
//!
//! Maps a [`ConditionsRecord`] to an integer score in `[0, 100]`.
//!
//! The score starts at 50 and each factor contributes independently:
//!
//! | Factor | Condition | Delta |
//! |---|---|---|
//! | Wave height | 1.5-2.5 m | +20 |
//! | Wave height | < 0.8 m or > 3.5 m | -15 |
//! | Wave period | ≥ 12 s | +15 |
//! | Wave period | < 10 s | -10 |
//! | Wind speed | < 10 m/s | +15 |
//! | Wind speed | > 20 m/s | -15 |
//! | Tide phase | rising / falling | +10 |
//! | Tide phase | high | +5 |
//! | User rating | present | (rating - 3) × 5 |
//! | Difficulty | beginner / intermediate / advanced / expert | +5 / 0 / -5 / -10 |
//!
//! The sum is rounded and clamped. Scoring is pure: no I/O, no randomness.

use crate::{ConditionsRecord, Difficulty, TidePhase};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BASE_SCORE: f64 = 50.0;
pub const MAX_SCORE: u8 = 100;

/// Narrative quality label for a score range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreBand {
    /// 75 and above
    Excellent,
    /// 50-74
    Good,
    /// 25-49
    Fair,
    /// below 25
    Poor,
}

impl ScoreBand {
    pub fn from_score(score: u8) -> Self {
        match score {
            75.. => ScoreBand::Excellent,
            50..=74 => ScoreBand::Good,
            25..=49 => ScoreBand::Fair,
            _ => ScoreBand::Poor,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ScoreBand::Excellent => "Excellent",
            ScoreBand::Good => "Good",
            ScoreBand::Fair => "Fair",
            ScoreBand::Poor => "Poor",
        }
    }
}

impl fmt::Display for ScoreBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Score the given conditions.
///
/// Non-finite readings count as 0, the same as a missing upstream value.
/// Negative or out-of-range readings are applied to the rules as given.
pub fn score(conditions: &ConditionsRecord) -> u8 {
    let total = BASE_SCORE
        + wave_height_delta(finite_or_zero(conditions.wave_height))
        + wave_period_delta(finite_or_zero(conditions.wave_period))
        + wind_delta(finite_or_zero(conditions.wind_speed))
        + tide_delta(conditions.tide_phase)
        + rating_delta(conditions.user_rating)
        + difficulty_delta(conditions.difficulty);

    total.round().clamp(0.0, f64::from(MAX_SCORE)) as u8
}

fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

fn wave_height_delta(height_m: f64) -> f64 {
    if (1.5..=2.5).contains(&height_m) {
        20.0
    } else if height_m < 0.8 || height_m > 3.5 {
        -15.0
    } else {
        0.0
    }
}

fn wave_period_delta(period_s: f64) -> f64 {
    if period_s >= 12.0 {
        15.0
    } else if period_s < 10.0 {
        -10.0
    } else {
        0.0
    }
}

fn wind_delta(speed_ms: f64) -> f64 {
    if speed_ms < 10.0 {
        15.0
    } else if speed_ms > 20.0 {
        -15.0
    } else {
        0.0
    }
}

fn tide_delta(phase: TidePhase) -> f64 {
    match phase {
        TidePhase::Rising | TidePhase::Falling => 10.0,
        TidePhase::High => 5.0,
        TidePhase::Low => 0.0,
    }
}

fn rating_delta(rating: Option<u8>) -> f64 {
    rating.map_or(0.0, |r| (f64::from(r) - 3.0) * 5.0)
}

/// Offset applied for the spot's difficulty level.
pub fn difficulty_delta(difficulty: Difficulty) -> f64 {
    match difficulty {
        Difficulty::Beginner => 5.0,
        Difficulty::Intermediate => 0.0,
        Difficulty::Advanced => -5.0,
        Difficulty::Expert => -10.0,
    }
}
