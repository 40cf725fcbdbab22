//! Engine configuration
//!
//! Small TOML file merged over defaults: every key optional, a missing
//! file means defaults, a malformed file is an error the caller sees.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::replay::cursor::ViewFilters;
use crate::trace::frame::DEFAULT_SAMPLE_PERIOD_US;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Sampling period of the traced runtime, microseconds. Drives frame
    /// grouping and the play clock.
    pub sample_period_us: u64,
    pub filters: ViewFilters,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sample_period_us: DEFAULT_SAMPLE_PERIOD_US,
            filters: ViewFilters::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    sample_period_us: Option<u64>,
    show_simulations: Option<bool>,
    show_io: Option<bool>,
    show_predictions: Option<bool>,
}

impl Config {
    /// Missing file is fine (defaults); an unreadable or malformed file is
    /// not.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(raw)?;
        let defaults = Self::default();
        Ok(Self {
            sample_period_us: parsed
                .sample_period_us
                .unwrap_or(defaults.sample_period_us),
            filters: ViewFilters {
                show_simulations: parsed
                    .show_simulations
                    .unwrap_or(defaults.filters.show_simulations),
                show_io: parsed.show_io.unwrap_or(defaults.filters.show_io),
                show_predictions: parsed
                    .show_predictions
                    .unwrap_or(defaults.filters.show_predictions),
            },
        })
    }
}
