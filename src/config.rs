//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the surf-config.toml file.
//! It provides a centralized way to configure upstream services, the language model,
//! caching, logging, and the table of known surf spots.
//!
//! Every section is optional in the file; missing keys take the defaults below.
//! Credentials can also be supplied through `OPENAI_API_KEY` and
//! `WORLDTIDES_API_KEY` via [`Config::apply_env`].

use crate::{Difficulty, Spot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_PATH: &str = "surf-config.toml";

/// Values shipped in example configs that must not be mistaken for real keys
const PLACEHOLDER_KEYS: &[&str] = &["your_openai_api_key_here", "your_worldtides_api_key_here"];

/// Application configuration loaded from surf-config.toml
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Marine weather service
    pub weather: WeatherConfig,
    /// Tide prediction service
    pub tides: TideConfig,
    /// Language model used for narrative summaries
    pub llm: LlmConfig,
    /// Upstream payload cache
    pub cache: CacheConfig,
    pub logging: LoggingConfig,
    /// Known surf spots, addressable by id from the command line
    pub spots: Vec<Spot>,
    /// Community ratings (1-5) keyed by spot id
    pub ratings: BTreeMap<String, u8>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Open-Meteo compatible marine forecast endpoint
    pub base_url: String,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TideConfig {
    /// WorldTides v3 endpoint
    pub base_url: String,
    /// WorldTides API key; without one, tides come from the synthetic model
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub cache_ttl_secs: u64,
    /// Length of the requested prediction window in seconds
    pub length_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI compatible API base, without the `/chat/completions` suffix
    pub base_url: String,
    /// API key; without one, narratives come from templates
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    Memory,
    File,
    None,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    /// Directory for the file backend
    pub dir: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (e.g. "info", "surf_score_lib=debug")
    pub level: String,
    pub format: LogFormat,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            base_url: "https://marine-api.open-meteo.com/v1/marine".to_string(),
            timeout_secs: 5,
            cache_ttl_secs: 1800,
        }
    }
}

impl Default for TideConfig {
    fn default() -> Self {
        TideConfig {
            base_url: "https://www.worldtides.info/api/v3".to_string(),
            api_key: None,
            timeout_secs: 5,
            cache_ttl_secs: 3600,
            length_secs: 259_200, // 3 days
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        LlmConfig {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            temperature: 0.7,
            max_tokens: 200,
            timeout_secs: 15,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            backend: CacheBackend::Memory,
            dir: "/tmp/surf-score-cache".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl WeatherConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl TideConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The API key, if one is set and is not a placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        usable_credential(self.api_key.as_deref())
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// The API key, if one is set and is not a placeholder.
    pub fn usable_api_key(&self) -> Option<&str> {
        usable_credential(self.api_key.as_deref())
    }
}

/// How a config file was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    Missing,
    /// The file exists but did not parse; carries the parser message
    Invalid(String),
}

/// Outcome of [`Config::load_reported`], logged once tracing is initialized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub path: PathBuf,
    pub status: LoadStatus,
    pub spots: usize,
    /// Values replaced while loading
    pub adjustments: Vec<String>,
}

impl LoadReport {
    pub fn log(&self) {
        let path = self.path.display();
        match &self.status {
            LoadStatus::Loaded => info!(path = %path, spots = self.spots, "loaded configuration"),
            LoadStatus::Missing => info!(path = %path, "no config file found, using defaults"),
            LoadStatus::Invalid(error) => {
                warn!(path = %path, error = %error, "invalid config file format, using defaults")
            }
        }
        for adjustment in &self.adjustments {
            warn!(path = %path, "{adjustment}");
        }
    }
}

/// A credential counts only when it is non-empty and not a shipped placeholder.
pub fn usable_credential(key: Option<&str>) -> Option<&str> {
    key.map(str::trim)
        .filter(|k| !k.is_empty() && !PLACEHOLDER_KEYS.contains(k))
}

/// The demo spots used when the config file does not list any.
pub fn default_spots() -> Vec<Spot> {
    let spot = |id: &str, name: &str, latitude: f64, longitude: f64, difficulty: Difficulty| Spot {
        id: id.to_string(),
        name: name.to_string(),
        latitude,
        longitude,
        difficulty,
    };

    vec![
        spot("malibu", "Malibu", 34.0259, -118.7798, Difficulty::Intermediate),
        spot(
            "huntington-beach",
            "Huntington Beach",
            33.6595,
            -117.9988,
            Difficulty::Beginner,
        ),
        spot("trestles", "Trestles", 33.3825, -117.5931, Difficulty::Intermediate),
        spot("rincon", "Rincon", 34.3733, -119.4795, Difficulty::Advanced),
        spot("blacks-beach", "Black's Beach", 32.8898, -117.2506, Difficulty::Expert),
    ]
}

impl Config {
    /// Load configuration from surf-config.toml
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path(DEFAULT_PATH)
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let (config, report) = Self::load_reported(path);
        report.log();
        config
    }

    /// Load configuration without logging, returning what happened.
    ///
    /// Used before the tracing subscriber exists; call [`LoadReport::log`]
    /// once logging is set up.
    pub fn load_reported<P: AsRef<Path>>(path: P) -> (Self, LoadReport) {
        let path = path.as_ref();
        let (mut config, status) = match fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => (config, LoadStatus::Loaded),
                Err(e) => (Self::default(), LoadStatus::Invalid(e.to_string())),
            },
            Err(_) => (Self::default(), LoadStatus::Missing),
        };

        if config.spots.is_empty() {
            config.spots = default_spots();
        }
        let adjustments = config.normalize_timeouts();

        let report = LoadReport {
            path: path.to_path_buf(),
            status,
            spots: config.spots.len(),
            adjustments,
        };
        (config, report)
    }

    /// Replace zero timeouts, which would fail every request, with the defaults.
    fn normalize_timeouts(&mut self) -> Vec<String> {
        let mut adjustments = Vec::new();
        let mut fix = |section: &str, value: &mut u64, default: u64| {
            if *value == 0 {
                *value = default;
                adjustments.push(format!("[{section}] timeout_secs = 0, using {default}"));
            }
        };

        fix("weather", &mut self.weather.timeout_secs, WeatherConfig::default().timeout_secs);
        fix("tides", &mut self.tides.timeout_secs, TideConfig::default().timeout_secs);
        fix("llm", &mut self.llm.timeout_secs, LlmConfig::default().timeout_secs);
        adjustments
    }

    /// Save current configuration to the given path
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "configuration saved");
        Ok(())
    }

    /// Fill credentials from `OPENAI_API_KEY` and `WORLDTIDES_API_KEY`.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Fill credentials from a variable lookup. Set variables override the file.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(key) = lookup("WORLDTIDES_API_KEY") {
            self.tides.api_key = Some(key);
        }
    }

    /// Look up a configured spot by id.
    pub fn spot(&self, id: &str) -> Option<&Spot> {
        self.spots.iter().find(|s| s.id == id)
    }
}
