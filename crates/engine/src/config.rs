// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine configuration, loaded from TOML.
//!
//! ```toml
//! include_return = true
//! retention_days = 30
//! tick_interval_ms = 1000
//!
//! [billing]
//! min_billable_hours = 2.0
//! call_out_hours = 0.5
//! hourly_rate = 120.0
//! currency = "AUD"
//! ```

use haul_core::BillingRates;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub billing: BillingRates,
    /// End each catalog with the "Return to depot" step
    pub include_return: bool,
    pub retention_days: u32,
    pub tick_interval_ms: u64,
    /// Overrides the platform state directory
    pub state_dir: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            billing: BillingRates::default(),
            include_return: true,
            retention_days: 30,
            tick_interval_ms: 1000,
            state_dir: None,
        }
    }
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `HAUL_CONFIG` if set, defaults otherwise.
    pub fn from_env() -> Result<Self, ConfigError> {
        match crate::env::config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let rates = &self.billing;
        for (name, value) in [
            ("billing.min_billable_hours", rates.min_billable_hours),
            ("billing.call_out_hours", rates.call_out_hours),
            ("billing.hourly_rate", rates.hourly_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if rates.currency.trim().is_empty() {
            return Err(ConfigError::Invalid("billing.currency must not be empty".to_string()));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid("tick_interval_ms must be positive".to_string()));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
