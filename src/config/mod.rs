//! Configuration module - environment variable parsing

use std::env;
use std::str::FromStr;

use crate::game::physics::Stage;
use crate::util::time::{DEFAULT_SNAPSHOT_EVERY, DEFAULT_TICK_RATE};

/// Application configuration loaded from environment variables
#[derive(Clone, Debug)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Simulation ticks per second
    pub tick_rate: u32,
    /// Broadcast a snapshot every N ticks
    pub snapshot_every: u32,
    /// Seed for the cosmetic particle RNG (random when unset)
    pub seed: Option<u64>,
    /// Stage geometry consumed by the physics step
    pub stage: Stage,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Stage::default();

        let tick_rate = parse_or(&lookup, "TICK_RATE", DEFAULT_TICK_RATE)?;
        if tick_rate == 0 {
            return Err(ConfigError::OutOfRange("TICK_RATE"));
        }
        let snapshot_every = parse_or(&lookup, "SNAPSHOT_EVERY", DEFAULT_SNAPSHOT_EVERY)?;
        if snapshot_every == 0 {
            return Err(ConfigError::OutOfRange("SNAPSHOT_EVERY"));
        }

        let stage = Stage {
            width: parse_or(&lookup, "STAGE_WIDTH", defaults.width)?,
            height: parse_or(&lookup, "STAGE_HEIGHT", defaults.height)?,
            ground_level: parse_or(&lookup, "GROUND_LEVEL", defaults.ground_level)?,
            ..defaults
        };
        if stage.width <= 2.0 * stage.margin || stage.ground_level > stage.height {
            return Err(ConfigError::OutOfRange("STAGE_WIDTH/GROUND_LEVEL"));
        }

        Ok(Self {
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            tick_rate,
            snapshot_every,
            seed: lookup("MATCH_SEED")
                .map(|raw| parse_value("MATCH_SEED", &raw))
                .transpose()?,
            stage,
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) => parse_value(var, &raw),
        None => Ok(default),
    }
}

fn parse_value<T: FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: raw.to_string(),
    })
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Environment variable out of range: {0}")]
    OutOfRange(&'static str),
}
