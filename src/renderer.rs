//! # Score Report Rendering
//!
//! Formats a [`ScoreResult`] for the terminal: a headline with the score bar,
//! the narrative, and a table of the conditions it was computed from. Results
//! built from synthetic data carry an offline banner.
//!
//! Heights are shown in meters and feet, wind in m/s and mph, and directions
//! with their compass label.

use crate::narrative::{direction_label, METERS_TO_FEET, MS_TO_MPH};
use crate::ScoreResult;

const BAR_WIDTH: usize = 20;

/// A 20-cell bar filled in proportion to the score.
fn score_bar(score: u8) -> String {
    let filled = (usize::from(score.min(100)) * BAR_WIDTH + 50) / 100;
    format!("[{}{}]", "█".repeat(filled), "░".repeat(BAR_WIDTH - filled))
}

fn compass(degrees: f64) -> String {
    format!("{:>3.0}° {:<2}", degrees, direction_label(degrees))
}

/// Render a report as a block of text.
pub fn report(result: &ScoreResult) -> String {
    let c = &result.factors;
    let mut lines = Vec::new();

    if c.offline {
        lines.push("⚠ OFFLINE (synthetic conditions)".to_string());
        lines.push(String::new());
    }

    lines.push(format!("{} ({})", c.spot_name, c.difficulty));
    lines.push(format!(
        "{} {:>3}/100  {}",
        score_bar(result.score),
        result.score,
        result.band
    ));
    lines.push(String::new());
    lines.push(result.summary.clone());
    lines.push(result.recommendation.clone());
    lines.push(String::new());

    lines.push(format!(
        "  Waves   {:>5.1} m ({:.1} ft)  {:>4.0} s  {}",
        c.wave_height,
        c.wave_height * METERS_TO_FEET,
        c.wave_period,
        compass(c.wave_direction)
    ));
    lines.push(format!(
        "  Wind    {:>5.1} m/s ({:.1} mph)  {}",
        c.wind_speed,
        c.wind_speed * MS_TO_MPH,
        compass(c.wind_direction)
    ));
    lines.push(format!("  Tide    {:>5.2} m  {}", c.tide_height, c.tide_phase));
    if let Some(rating) = c.user_rating {
        lines.push(format!(
            "  Rating  {}{} ({rating}/5)",
            "★".repeat(usize::from(rating)),
            "☆".repeat(5usize.saturating_sub(usize::from(rating)))
        ));
    }

    lines.push(String::new());
    lines.push(format!(
        "  Computed {}",
        result.computed_at.format("%Y-%m-%d %H:%M UTC")
    ));

    lines.join("\n")
}

/// Print a report to stdout.
pub fn draw_report(result: &ScoreResult) {
    println!("{}", report(result));
}
