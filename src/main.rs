//! # Surf Score Application Entry Point
//!
//! Scores one surf spot, an ad-hoc coordinate, or every configured spot and
//! prints either a terminal report or JSON.
//!
//! ```text
//! surf-score                          # every spot in surf-config.toml
//! surf-score --spot trestles          # one configured spot
//! surf-score --lat 34.03 --lng -118.78 --name "Zuma" --difficulty beginner
//! surf-score --offline --json         # synthetic data, machine-readable
//! ```

#[cfg(test)]
mod tests;

use anyhow::{anyhow, Context};
use clap::Parser;
use std::path::PathBuf;
use surf_score_lib::config::{Config, DEFAULT_PATH};
use surf_score_lib::engine::ScoreEngine;
use surf_score_lib::{logging, renderer, Difficulty, ScoreResult, Spot};
use tokio::task::JoinSet;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "surf-score")]
#[command(about = "Score surf conditions for a spot from wave, wind and tide data")]
pub struct Args {
    /// Id of a spot from the config's [[spots]] table
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    spot: Option<String>,

    /// Latitude of an ad-hoc spot
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude of an ad-hoc spot
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,

    /// Display name of an ad-hoc spot
    #[arg(long, requires = "lat")]
    name: Option<String>,

    /// Difficulty of an ad-hoc spot (beginner, intermediate, advanced, expert)
    #[arg(long, requires = "lat")]
    difficulty: Option<Difficulty>,

    /// Print results as JSON instead of a report
    #[arg(long)]
    json: bool,

    /// Skip all network services and use synthetic conditions
    #[arg(long)]
    offline: bool,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<PathBuf>,
}

/// Spots selected by the command line.
pub fn select_spots(args: &Args, config: &Config) -> anyhow::Result<Vec<Spot>> {
    if let Some(id) = &args.spot {
        let spot = config.spot(id).cloned().ok_or_else(|| {
            let known: Vec<&str> = config.spots.iter().map(|s| s.id.as_str()).collect();
            anyhow!("unknown spot '{id}' (known: {})", known.join(", "))
        })?;
        return Ok(vec![spot]);
    }

    if let (Some(latitude), Some(longitude)) = (args.lat, args.lng) {
        return Ok(vec![Spot {
            id: format!("custom_{latitude}_{longitude}"),
            name: args.name.clone().unwrap_or_else(|| "Custom Spot".to_string()),
            latitude,
            longitude,
            difficulty: args.difficulty.unwrap_or(Difficulty::Intermediate),
        }]);
    }

    Ok(config.spots.clone())
}

/// Score every spot concurrently, keeping the input order.
async fn score_spots(engine: &ScoreEngine, spots: Vec<Spot>) -> anyhow::Result<Vec<ScoreResult>> {
    let mut tasks = JoinSet::new();
    for (index, spot) in spots.into_iter().enumerate() {
        let engine = engine.clone();
        tasks.spawn(async move { (index, engine.calculate(&spot).await) });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined.context("scoring task failed")?);
    }
    results.sort_by_key(|(index, _)| *index);

    Ok(results.into_iter().map(|(_, result)| result).collect())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_PATH));
    let (mut config, load_report) = Config::load_reported(&config_path);

    logging::init(&config.logging)?;
    load_report.log();

    if let Some(path) = &args.write_config {
        return config.save_to_path(path);
    }

    config.apply_env();

    let spots = select_spots(&args, &config)?;
    let engine = if args.offline {
        info!("offline mode, network services disabled");
        ScoreEngine::offline()
    } else {
        ScoreEngine::from_config(&config).context("failed to set up upstream clients")?
    };

    let runtime = tokio::runtime::Runtime::new()?;
    let results = runtime.block_on(score_spots(&engine, spots))?;

    if args.json {
        let json = match results.as_slice() {
            [single] => serde_json::to_string_pretty(single)?,
            all => serde_json::to_string_pretty(all)?,
        };
        println!("{json}");
        return Ok(());
    }

    for (i, result) in results.iter().enumerate() {
        if i > 0 {
            println!("\n{}\n", "─".repeat(48));
        }
        renderer::draw_report(result);
    }

    Ok(())
}
