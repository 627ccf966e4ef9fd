//! # Synthetic Conditions Model
//!
//! Offline stand-in for the marine weather and tide services. It produces
//! plausible data so the whole pipeline stays exercisable without network
//! access or credentials.
//!
//! ## Conditions
//! Each field is drawn uniformly from a fixed surfable range:
//! - wave height 0.5-3.0 m, wave period 8-16 s
//! - tide height 0.5-2.5 m, phase uniformly one of the four phases
//! - wind speed 5-25 m/s, directions 0-360°
//!
//! ## Tide Series
//! A semidiurnal pattern anchored at "now":
//! - **Extremes**: 12 alternating High/Low points every 6.2 hours, starting with a
//!   High at "now", heights `1.5 ± 0.8` m plus up to 0.3 m of jitter
//! - **Heights**: 144 samples every 30 minutes (3 days) following
//!   `1.5 + 0.8 × sin(hours / 6.2 × π)`
//!
//! Heights are rounded to centimeters like a tide service reports them.
//! The returned series is always marked `offline`.

use crate::{ConditionsRecord, Difficulty, TideExtreme, TideKind, TidePhase, TideSample, TideSeries};
use chrono::{DateTime, Utc};
use rand::Rng;
use std::f64::consts::PI;

/// Mean tide level of the synthetic curve, meters
pub const BASE_HEIGHT_M: f64 = 1.5;
/// Tide amplitude around the mean, meters
pub const RANGE_M: f64 = 0.8;
/// Maximum extra height added beyond the amplitude at an extreme, meters
pub const JITTER_M: f64 = 0.3;
/// Time between consecutive extremes, hours
pub const EXTREME_INTERVAL_HOURS: f64 = 6.2;
pub const EXTREME_COUNT: usize = 12;
pub const SAMPLE_INTERVAL_SECS: i64 = 1800;
/// 3 days of half-hourly samples
pub const SAMPLE_COUNT: usize = 144;

/// Uniform draw from `[min, max)`.
fn in_range<R: Rng + ?Sized>(rng: &mut R, min: f64, max: f64) -> f64 {
    min + rng.gen::<f64>() * (max - min)
}

fn round_cm(height_m: f64) -> f64 {
    (height_m * 100.0).round() / 100.0
}

/// Draw a full set of random but plausible conditions for a spot.
///
/// The record is marked `offline` and never carries a user rating.
pub fn random_conditions<R: Rng + ?Sized>(
    rng: &mut R,
    spot_name: &str,
    difficulty: Difficulty,
) -> ConditionsRecord {
    ConditionsRecord {
        wave_height: in_range(rng, 0.5, 3.0),
        wave_direction: in_range(rng, 0.0, 360.0),
        wave_period: in_range(rng, 8.0, 16.0),
        tide_height: in_range(rng, 0.5, 2.5),
        tide_phase: TidePhase::ALL[rng.gen_range(0..TidePhase::ALL.len())],
        wind_speed: in_range(rng, 5.0, 25.0),
        wind_direction: in_range(rng, 0.0, 360.0),
        user_rating: None,
        spot_name: spot_name.to_string(),
        difficulty,
        offline: true,
    }
}

/// [`random_conditions`] with the thread-local generator.
pub fn conditions(spot_name: &str, difficulty: Difficulty) -> ConditionsRecord {
    random_conditions(&mut rand::thread_rng(), spot_name, difficulty)
}

/// Generate a synthetic 3-day tide series starting at `now` (Unix seconds).
pub fn synthetic_tides<R: Rng + ?Sized>(rng: &mut R, now: i64) -> TideSeries {
    let interval_secs = EXTREME_INTERVAL_HOURS * 3600.0;

    let mut extremes = Vec::with_capacity(EXTREME_COUNT);
    let mut is_high = true;
    for i in 0..EXTREME_COUNT {
        let jitter = rng.gen::<f64>() * JITTER_M;
        let height_m = if is_high {
            BASE_HEIGHT_M + RANGE_M + jitter
        } else {
            BASE_HEIGHT_M - RANGE_M - jitter
        };

        extremes.push(TideExtreme {
            timestamp: now + (i as f64 * interval_secs).floor() as i64,
            height_m: round_cm(height_m),
            kind: if is_high { TideKind::High } else { TideKind::Low },
        });
        is_high = !is_high;
    }

    let mut heights = Vec::with_capacity(SAMPLE_COUNT);
    for i in 0..SAMPLE_COUNT {
        let offset_secs = i as i64 * SAMPLE_INTERVAL_SECS;
        let hours_since_start = offset_secs as f64 / 3600.0;
        let phase = hours_since_start / EXTREME_INTERVAL_HOURS * PI;

        heights.push(TideSample {
            timestamp: now + offset_secs,
            height_m: round_cm(BASE_HEIGHT_M + RANGE_M * phase.sin()),
        });
    }

    TideSeries {
        extremes,
        heights,
        offline: true,
    }
}

/// Generate a synthetic tide series anchored at `now`.
/// If `now` is `None`, fall back to `Utc::now()`.
pub fn approximate(now: Option<DateTime<Utc>>) -> TideSeries {
    let now = now.unwrap_or_else(Utc::now);
    synthetic_tides(&mut rand::thread_rng(), now.timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const NOW: i64 = 1_753_315_200; // 2025-07-24T00:00:00Z

    #[test]
    fn extremes_alternate_starting_with_high() {
        let series = synthetic_tides(&mut StdRng::seed_from_u64(7), NOW);

        assert_eq!(series.extremes.len(), EXTREME_COUNT);
        assert_eq!(series.extremes[0].kind, TideKind::High);
        assert_eq!(series.extremes[0].timestamp, NOW);
        for pair in series.extremes.windows(2) {
            assert_ne!(pair[0].kind, pair[1].kind, "extremes must alternate");
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[test]
    fn extremes_are_spaced_about_six_hours() {
        let series = synthetic_tides(&mut StdRng::seed_from_u64(1), NOW);
        for pair in series.extremes.windows(2) {
            let gap = pair[1].timestamp - pair[0].timestamp;
            assert!((22_319..=22_321).contains(&gap), "gap {gap}s");
        }
    }

    #[test]
    fn extreme_heights_stay_on_their_side_of_mean() {
        let series = synthetic_tides(&mut StdRng::seed_from_u64(42), NOW);
        for e in &series.extremes {
            match e.kind {
                TideKind::High => assert!((2.3..=2.6).contains(&e.height_m), "{}", e.height_m),
                TideKind::Low => assert!((0.4..=0.7).contains(&e.height_m), "{}", e.height_m),
            }
        }
    }

    #[test]
    fn heights_cover_three_days_at_half_hour_spacing() {
        let series = synthetic_tides(&mut StdRng::seed_from_u64(3), NOW);

        assert_eq!(series.heights.len(), SAMPLE_COUNT);
        assert_eq!(series.heights[0].timestamp, NOW);
        for pair in series.heights.windows(2) {
            assert_eq!(pair[1].timestamp - pair[0].timestamp, SAMPLE_INTERVAL_SECS);
        }
        assert!(series.offline);
    }

    #[test]
    fn heights_stay_within_tidal_range() {
        let series = synthetic_tides(&mut StdRng::seed_from_u64(9), NOW);
        let low = BASE_HEIGHT_M - RANGE_M - JITTER_M;
        let high = BASE_HEIGHT_M + RANGE_M + JITTER_M;
        for s in &series.heights {
            assert!(
                (low..=high).contains(&s.height_m),
                "height {} outside [{low}, {high}]",
                s.height_m
            );
        }
        // first sample sits on the mean
        assert_eq!(series.heights[0].height_m, 1.5);
    }

    #[test]
    fn random_conditions_stay_in_ranges() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..500 {
            let c = random_conditions(&mut rng, "Malibu", Difficulty::Intermediate);
            assert!((0.5..3.0).contains(&c.wave_height));
            assert!((0.0..360.0).contains(&c.wave_direction));
            assert!((8.0..16.0).contains(&c.wave_period));
            assert!((0.5..2.5).contains(&c.tide_height));
            assert!((5.0..25.0).contains(&c.wind_speed));
            assert!((0.0..360.0).contains(&c.wind_direction));
            assert_eq!(c.user_rating, None);
            assert_eq!(c.spot_name, "Malibu");
            assert!(c.offline);
        }
    }

    #[test]
    fn random_conditions_reach_every_phase() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            seen.insert(random_conditions(&mut rng, "Rincon", Difficulty::Advanced).tide_phase);
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn seeded_generation_is_repeatable() {
        let a = synthetic_tides(&mut StdRng::seed_from_u64(5), NOW);
        let b = synthetic_tides(&mut StdRng::seed_from_u64(5), NOW);
        assert_eq!(a, b);
    }

    #[test]
    fn approximate_anchors_on_given_time() {
        let t0 = Utc.with_ymd_and_hms(2025, 7, 24, 0, 0, 0).unwrap();
        let series = approximate(Some(t0));
        assert_eq!(series.heights[0].timestamp, t0.timestamp());
        assert_eq!(series.extremes[0].timestamp, t0.timestamp());
    }
}
