//! Table configuration: conversion ratio, chip set and starting stack.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::amount::{Points, Ratio, UnitConverter};
use crate::chips::{ChipTally, DEFAULT_DENOMINATIONS};

/// Environment variable naming a JSON config file.
pub const CONFIG_ENV: &str = "CHIP_LEDGER_CONFIG";

/// Starting stack per player when nothing else is configured.
pub const DEFAULT_BASELINE: Points = Points::new(30_000);

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("conversion ratio must be positive on both sides, got {0}:{1}")]
    InvalidRatio(i64, i64),

    #[error("chip denominations must be positive, got {0}")]
    InvalidDenomination(i64),

    #[error("at least one chip denomination is required")]
    NoDenominations,

    #[error("starting stack must not be negative, got {0}")]
    NegativeBaseline(Points),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ratio: Ratio,
    pub denominations: Vec<i64>,
    /// Chips each player starts with.
    pub baseline: Points,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ratio: Ratio::default(),
            denominations: DEFAULT_DENOMINATIONS.to_vec(),
            baseline: DEFAULT_BASELINE,
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Load from the file named by [`CONFIG_ENV`], or defaults when it is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::from_path(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.ratio.is_valid() {
            return Err(ConfigError::InvalidRatio(
                self.ratio.points,
                self.ratio.currency,
            ));
        }
        if self.denominations.is_empty() {
            return Err(ConfigError::NoDenominations);
        }
        if let Some(&bad) = self.denominations.iter().find(|&&d| d <= 0) {
            return Err(ConfigError::InvalidDenomination(bad));
        }
        if self.baseline.value() < 0 {
            return Err(ConfigError::NegativeBaseline(self.baseline));
        }
        Ok(())
    }

    pub fn converter(&self) -> UnitConverter {
        UnitConverter::new(self.ratio)
    }

    pub fn tally(&self) -> ChipTally {
        ChipTally::new(self.denominations.iter().copied())
    }
}
