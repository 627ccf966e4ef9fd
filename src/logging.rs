//! Tracing subscriber setup for the `surf-score` binary.
//!
//! Logs go to stderr so stdout carries only the report (or JSON result).
//! `RUST_LOG`, when set, replaces the configured level.

use crate::config::{LogFormat, LoggingConfig};
use std::{env, io};
use tracing::debug;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives for the configured level plus quieter HTTP internals.
pub fn filter_for(config: &LoggingConfig) -> EnvFilter {
    let base = env::var("RUST_LOG").unwrap_or_else(|_| config.level.clone());

    ["hyper=warn", "reqwest=warn"]
        .into_iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(EnvFilter::new(base), EnvFilter::add_directive)
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(filter_for(config));

    match config.format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_target(true).with_writer(io::stderr))
            .try_init()?,
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_file(true)
                    .with_line_number(true)
                    .with_target(true)
                    .with_writer(io::stderr),
            )
            .try_init()?,
        LogFormat::Compact => registry
            .with(
                fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stderr),
            )
            .try_init()?,
    }

    debug!(level = %config.level, format = ?config.format, "logging initialized");
    Ok(())
}
