//! # Tide Phase Resolution
//!
//! Derives the current tide height and qualitative phase from a tide payload:
//!
//! 1. **Height**: the sampled height closest in time to `now`
//! 2. **Phase**: the first pair of consecutive extremes bracketing `now` decides
//!    rising (Low→High) or falling (High→Low); default is rising
//! 3. **Slack water**: an extreme within 10 minutes of `now` overrides the phase
//!    with high or low
//!
//! A payload that cannot be resolved (no samples, unusable heights) yields
//! [`TideReading::FALLBACK`] instead of an error.

use crate::{TideExtreme, TideKind, TidePhase, TideSample, TideSeries};
use thiserror::Error;
use tracing::warn;

/// Window around an extreme, in seconds, within which the tide counts as high or low.
pub const SLACK_WINDOW_SECS: u64 = 600;

/// Current tide state derived from a tide payload.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TideReading {
    pub height_m: f64,
    pub phase: TidePhase,
}

impl TideReading {
    /// Reading used whenever the payload cannot be resolved.
    pub const FALLBACK: TideReading = TideReading {
        height_m: 1.5,
        phase: TidePhase::Rising,
    };
}

#[derive(Debug, Error)]
enum ResolveError {
    #[error("no tide height samples")]
    NoSamples,

    #[error("non-finite tide height at t={0}")]
    NonFiniteHeight(i64),
}

/// Resolve tide height and phase at `now` (Unix seconds).
///
/// Never fails: unusable payloads produce [`TideReading::FALLBACK`].
pub fn resolve(samples: &[TideSample], extremes: &[TideExtreme], now: i64) -> TideReading {
    match try_resolve(samples, extremes, now) {
        Ok(reading) => reading,
        Err(err) => {
            warn!(error = %err, "tide payload unusable, using fallback reading");
            TideReading::FALLBACK
        }
    }
}

/// Resolve a whole [`TideSeries`] at `now` (Unix seconds).
pub fn resolve_series(series: &TideSeries, now: i64) -> TideReading {
    resolve(&series.heights, &series.extremes, now)
}

fn try_resolve(
    samples: &[TideSample],
    extremes: &[TideExtreme],
    now: i64,
) -> Result<TideReading, ResolveError> {
    let closest = closest_sample(samples, now).ok_or(ResolveError::NoSamples)?;
    if !closest.height_m.is_finite() {
        return Err(ResolveError::NonFiniteHeight(closest.timestamp));
    }

    let phase = slack_phase(extremes, now)
        .or_else(|| bracket_phase(extremes, now))
        .unwrap_or(TidePhase::Rising);

    Ok(TideReading {
        height_m: closest.height_m,
        phase,
    })
}

/// Sample nearest to `now`. On equal distance the earlier-iterated sample wins.
fn closest_sample(samples: &[TideSample], now: i64) -> Option<&TideSample> {
    let mut iter = samples.iter();
    let mut best = iter.next()?;
    let mut best_diff = best.timestamp.abs_diff(now);

    for sample in iter {
        let diff = sample.timestamp.abs_diff(now);
        if diff < best_diff {
            best = sample;
            best_diff = diff;
        }
    }

    Some(best)
}

/// Phase implied by the first pair of consecutive extremes that brackets `now`.
///
/// Returns `None` when no pair brackets `now`, or when the bracketing pair does
/// not alternate (High→High, Low→Low). Extremes are taken as given; ordering and
/// alternation are not validated.
fn bracket_phase(extremes: &[TideExtreme], now: i64) -> Option<TidePhase> {
    let pair = extremes
        .windows(2)
        .find(|w| w[0].timestamp <= now && now <= w[1].timestamp)?;

    match (pair[0].kind, pair[1].kind) {
        (TideKind::Low, TideKind::High) => Some(TidePhase::Rising),
        (TideKind::High, TideKind::Low) => Some(TidePhase::Falling),
        _ => None,
    }
}

/// High or low if any extreme lies strictly within the slack window of `now`.
fn slack_phase(extremes: &[TideExtreme], now: i64) -> Option<TidePhase> {
    extremes
        .iter()
        .find(|e| e.timestamp.abs_diff(now) < SLACK_WINDOW_SECS)
        .map(|e| match e.kind {
            TideKind::High => TidePhase::High,
            TideKind::Low => TidePhase::Low,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn sample(offset: i64, height_m: f64) -> TideSample {
        TideSample {
            timestamp: NOW + offset,
            height_m,
        }
    }

    fn extreme(offset: i64, kind: TideKind) -> TideExtreme {
        TideExtreme {
            timestamp: NOW + offset,
            height_m: if kind == TideKind::High { 2.3 } else { 0.7 },
            kind,
        }
    }

    fn hourly_samples() -> Vec<TideSample> {
        (-3..=3).map(|h| sample(h * 3600, 1.5 + h as f64 * 0.1)).collect()
    }

    #[test]
    fn empty_samples_fall_back() {
        let extremes = vec![extreme(-3600, TideKind::Low), extreme(3600, TideKind::High)];
        assert_eq!(resolve(&[], &extremes, NOW), TideReading::FALLBACK);
        assert_eq!(TideReading::FALLBACK.height_m, 1.5);
        assert_eq!(TideReading::FALLBACK.phase, TidePhase::Rising);
    }

    #[test]
    fn non_finite_height_falls_back() {
        let samples = vec![sample(0, f64::NAN)];
        assert_eq!(resolve(&samples, &[], NOW), TideReading::FALLBACK);
    }

    #[test]
    fn picks_closest_sample_height() {
        let samples = vec![sample(-1800, 1.1), sample(-300, 1.4), sample(1200, 1.9)];
        let reading = resolve(&samples, &[], NOW);
        assert_eq!(reading.height_m, 1.4);
    }

    #[test]
    fn closest_sample_tie_keeps_first() {
        let samples = vec![sample(-600, 1.0), sample(600, 2.0)];
        assert_eq!(resolve(&samples, &[], NOW).height_m, 1.0);

        let reversed = vec![sample(600, 2.0), sample(-600, 1.0)];
        assert_eq!(resolve(&reversed, &[], NOW).height_m, 2.0);
    }

    #[test]
    fn low_to_high_bracket_is_rising() {
        let extremes = vec![extreme(-7200, TideKind::Low), extreme(7200, TideKind::High)];
        let reading = resolve(&hourly_samples(), &extremes, NOW);
        assert_eq!(reading.phase, TidePhase::Rising);
    }

    #[test]
    fn high_to_low_bracket_is_falling() {
        let extremes = vec![
            extreme(-30_000, TideKind::Low),
            extreme(-7200, TideKind::High),
            extreme(7200, TideKind::Low),
        ];
        let reading = resolve(&hourly_samples(), &extremes, NOW);
        assert_eq!(reading.phase, TidePhase::Falling);
    }

    #[test]
    fn non_alternating_pair_keeps_default() {
        let extremes = vec![extreme(-7200, TideKind::High), extreme(7200, TideKind::High)];
        let reading = resolve(&hourly_samples(), &extremes, NOW);
        assert_eq!(reading.phase, TidePhase::Rising);
    }

    #[test]
    fn single_extreme_skips_bracket_scan() {
        let extremes = vec![extreme(-7200, TideKind::High)];
        let reading = resolve(&hourly_samples(), &extremes, NOW);
        assert_eq!(reading.phase, TidePhase::Rising);
    }

    #[test]
    fn nearby_extreme_overrides_bracket_phase() {
        // Low→High bracket implies rising, but a Low sits 5 minutes away
        let extremes = vec![extreme(-300, TideKind::Low), extreme(21_000, TideKind::High)];
        let reading = resolve(&hourly_samples(), &extremes, NOW);
        assert_eq!(reading.phase, TidePhase::Low);
    }

    #[test]
    fn nearby_high_extreme_is_high() {
        let extremes = vec![extreme(-21_000, TideKind::Low), extreme(120, TideKind::High)];
        let reading = resolve(&hourly_samples(), &extremes, NOW);
        assert_eq!(reading.phase, TidePhase::High);
    }

    #[test]
    fn slack_window_is_exclusive() {
        let extremes = vec![extreme(-600, TideKind::High), extreme(21_000, TideKind::Low)];
        assert_eq!(
            resolve(&hourly_samples(), &extremes, NOW).phase,
            TidePhase::Falling
        );

        let extremes = vec![extreme(-599, TideKind::High), extreme(21_000, TideKind::Low)];
        assert_eq!(
            resolve(&hourly_samples(), &extremes, NOW).phase,
            TidePhase::High
        );
    }

    #[test]
    fn resolve_series_uses_heights_and_extremes() {
        let series = TideSeries {
            extremes: vec![extreme(-7200, TideKind::High), extreme(7200, TideKind::Low)],
            heights: hourly_samples(),
            offline: false,
        };
        let reading = resolve_series(&series, NOW);
        assert_eq!(reading.phase, TidePhase::Falling);
        assert_eq!(reading.height_m, 1.5);
    }
}
