//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;

use crate::util::time::{MAX_TPS, SIMULATION_TPS, SNAPSHOT_TPS};

/// Runtime configuration loaded from environment variables
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Match seed; `None` draws one from entropy
    pub match_seed: Option<u64>,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Snapshots published per second
    pub snapshot_rate: u32,
    /// Stop the run after this many ticks
    pub max_ticks: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            match_seed: None,
            tick_rate: SIMULATION_TPS,
            snapshot_rate: SNAPSHOT_TPS,
            max_ticks: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let defaults = Self::default();

        let tick_rate = parse(&lookup, "TICK_RATE")?.unwrap_or(defaults.tick_rate);
        if tick_rate == 0 || tick_rate > MAX_TPS {
            return Err(ConfigError::Invalid("TICK_RATE"));
        }
        let snapshot_rate = parse(&lookup, "SNAPSHOT_RATE")?.unwrap_or(defaults.snapshot_rate);
        if snapshot_rate == 0 {
            return Err(ConfigError::Invalid("SNAPSHOT_RATE"));
        }

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            match_seed: parse(&lookup, "MATCH_SEED")?,
            tick_rate,
            snapshot_rate,
            max_ticks: parse(&lookup, "MAX_TICKS")?,
        })
    }
}

fn parse<T, F>(lookup: &F, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&'static str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::Invalid(key)),
        None => Ok(None),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}
