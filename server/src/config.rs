//! Server configuration loaded from TOML.

use std::{fs, io, path::Path, time::Duration};

use lane_defence_system_scheduler::Config as SchedulerConfig;
use lane_defence_world::Rules;
use serde::Deserialize;
use thiserror::Error;

/// Tunables shared by every session hosted by a registry.
///
/// Every key is optional in the TOML source; missing keys keep their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Session tick cadence in milliseconds.
    pub tick_period_ms: u64,
    /// Countdown between the second join and the match start, in milliseconds.
    pub start_delay_ms: u64,
    /// Cadence of repair buildings in milliseconds.
    pub repair_period_ms: u64,
    /// Gold granted to each player when they take a seat.
    pub starting_gold: u32,
    /// Gold-per-tick each player starts with.
    pub base_gold_per_tick: u32,
    /// Initial and maximum health of each base.
    pub base_health: i32,
    /// Notifications buffered per session before slow subscribers lag.
    pub notification_capacity: usize,
    /// Requests queued per session before callers wait.
    pub command_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            tick_period_ms: 1_000,
            start_delay_ms: 5_000,
            repair_period_ms: 1_000,
            starting_gold: 0,
            base_gold_per_tick: 1,
            base_health: 300,
            notification_capacity: 64,
            command_capacity: 32,
        }
    }
}

impl ServerConfig {
    /// Reads and validates a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would stall a session.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_period_ms == 0 {
            return Err(ConfigError::Invalid("tick_period_ms must be positive"));
        }
        if self.repair_period_ms == 0 {
            return Err(ConfigError::Invalid("repair_period_ms must be positive"));
        }
        if self.base_health <= 0 {
            return Err(ConfigError::Invalid("base_health must be positive"));
        }
        if self.notification_capacity == 0 || self.command_capacity == 0 {
            return Err(ConfigError::Invalid("channel capacities must be positive"));
        }
        Ok(())
    }

    /// Economy and base numbers handed to each world.
    #[must_use]
    pub fn rules(&self) -> Rules {
        Rules {
            starting_gold: self.starting_gold,
            base_gold_per_tick: self.base_gold_per_tick,
            base_health: self.base_health,
        }
    }

    /// Cadences handed to each scheduler.
    #[must_use]
    pub fn scheduler(&self) -> SchedulerConfig {
        SchedulerConfig::new(
            Duration::from_millis(self.tick_period_ms),
            Duration::from_millis(self.start_delay_ms),
            Duration::from_millis(self.repair_period_ms),
        )
    }
}

/// Failures raised while loading a [`ServerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config at {path}")]
    Read {
        /// Path that was requested.
        path: String,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config toml")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range.
    #[error("invalid config: {0}")]
    Invalid(&'static str),
}
