// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the engine crate.

use crate::config::EngineConfig;
use std::path::PathBuf;

/// Overrides every other state directory source
pub const STATE_DIR_VAR: &str = "HAUL_STATE_DIR";
/// Optional path of a TOML config file
pub const CONFIG_VAR: &str = "HAUL_CONFIG";

/// Resolve state directory: HAUL_STATE_DIR > config > XDG_STATE_HOME/haul > local data dir/haul
pub fn state_dir(config: &EngineConfig) -> Option<PathBuf> {
    resolve_state_dir(
        non_empty_var(STATE_DIR_VAR).map(PathBuf::from),
        config.state_dir.clone(),
        non_empty_var("XDG_STATE_HOME").map(PathBuf::from),
        dirs::data_local_dir(),
    )
}

/// The precedence rules of [`state_dir`], without touching the environment.
pub fn resolve_state_dir(
    env_override: Option<PathBuf>,
    configured: Option<PathBuf>,
    xdg_state_home: Option<PathBuf>,
    data_local_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    env_override
        .or(configured)
        .or_else(|| xdg_state_home.map(|dir| dir.join("haul")))
        .or_else(|| data_local_dir.map(|dir| dir.join("haul")))
}

pub fn config_path() -> Option<PathBuf> {
    non_empty_var(CONFIG_VAR).map(PathBuf::from)
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
