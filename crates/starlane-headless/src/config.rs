//! Environment-driven settings for the headless host.

use std::path::PathBuf;

use starlane_core::SimConfig;
use tracing::Level;

/// Headless run configuration
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Simulation tuning, from `STARLANE_CONFIG` if set
    pub sim: SimConfig,
    /// Where `sim` was loaded from
    pub config_path: Option<PathBuf>,
    /// Number of ticks to run
    pub ticks: u64,
    /// Master seed
    pub seed: u64,
}

impl Default for HeadlessConfig {
    fn default() -> Self {
        Self {
            sim: SimConfig::default(),
            config_path: None,
            // Ten simulated seconds at 60 Hz
            ticks: 600,
            seed: 42,
        }
    }
}

impl HeadlessConfig {
    /// Load config from environment or use defaults
    pub fn load_or_default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), |path| std::fs::read_to_string(path))
    }

    fn from_lookup(
        var: impl Fn(&str) -> Option<String>,
        read: impl Fn(&PathBuf) -> std::io::Result<String>,
    ) -> Self {
        let mut config = Self::default();

        if let Some(path) = var("STARLANE_CONFIG").map(PathBuf::from) {
            match read(&path) {
                Ok(json) => match SimConfig::from_json_str(&json) {
                    Ok(sim) => {
                        config.sim = sim;
                        config.config_path = Some(path);
                    }
                    Err(e) => {
                        tracing::warn!("Invalid config {}: {}, using defaults", path.display(), e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Cannot read {}: {}, using defaults", path.display(), e);
                }
            }
        }

        if let Some(ticks) = var("STARLANE_TICKS") {
            match ticks.parse::<u64>() {
                Ok(parsed) if parsed > 0 => config.ticks = parsed,
                Ok(_) => tracing::warn!("STARLANE_TICKS must be > 0, using default"),
                Err(_) => tracing::warn!("Invalid STARLANE_TICKS '{}', using default", ticks),
            }
        }

        if let Some(seed) = var("STARLANE_SEED") {
            if let Ok(parsed) = seed.parse::<u64>() {
                config.seed = parsed;
            } else {
                tracing::warn!("Invalid STARLANE_SEED '{}', using default", seed);
            }
        }

        config
    }
}

/// Log level from `STARLANE_LOG`, and the rejected value if it did not parse.
pub fn log_level() -> (Level, Option<String>) {
    parse_level(std::env::var("STARLANE_LOG").ok())
}

fn parse_level(value: Option<String>) -> (Level, Option<String>) {
    match value {
        None => (Level::INFO, None),
        Some(raw) => match raw.parse::<Level>() {
            Ok(level) => (level, None),
            Err(_) => (Level::INFO, Some(raw)),
        },
    }
}
