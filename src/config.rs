// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::ErApiClient;
use crate::models::CurrencyCode;
use crate::state::RefreshPolicy;

pub const CONFIG_ENV: &str = "CURRENCY_EXCHANGER_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the rate service; `/latest/{code}` is appended.
    pub api_base_url: String,
    /// Base currency preselected when the converter opens.
    pub default_base: Option<CurrencyCode>,
    pub refresh: RefreshPolicy,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: ErApiClient::DEFAULT_URL.to_string(),
            default_base: None,
            refresh: RefreshPolicy::default(),
            request_timeout_secs: 10,
        }
    }
}

impl Config {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

pub fn get_config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"))
}

pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(&get_config_path())
}

/// A missing file means defaults; a broken one is an error.
pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        log::debug!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: Config = toml::from_str(&config_str)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(config)
}

pub fn save_config(config: &Config, path: &Path) -> anyhow::Result<()> {
    let config_str = toml::to_string_pretty(config)?;
    fs::write(path, config_str).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
