// src/cfg/config.rs

use eyre::{eyre, Result};
use log::{debug, error};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;
use crate::probe::ProbeSettings;

pub const DEFAULT_SEARCH_QUERY: &str = "in:inbox -from:me";
pub const DEFAULT_REPLY_SUBJECT: &str = "Test Reply - Gmail Threading Test";

/// Run settings. Every field is optional in the YAML file; the CLI
/// overrides whatever the file provides.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(alias = "credentials-path")]
    pub credentials_path: PathBuf,

    #[serde(alias = "token-path")]
    pub token_path: PathBuf,

    #[serde(alias = "search-query")]
    pub search_query: String,

    #[serde(alias = "max-results")]
    pub max_results: u32,

    /// Wait before re-reading a thread after a send.
    #[serde(alias = "settle-secs")]
    pub settle_secs: u64,

    /// Wait between two strategies.
    #[serde(alias = "pace-secs")]
    pub pace_secs: u64,

    #[serde(alias = "reply-subject")]
    pub reply_subject: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            credentials_path: PathBuf::from("credentials.json"),
            token_path: PathBuf::from("token.json"),
            search_query: DEFAULT_SEARCH_QUERY.to_string(),
            max_results: 10,
            settle_secs: 3,
            pace_secs: 2,
            reply_subject: DEFAULT_REPLY_SUBJECT.to_string(),
        }
    }
}

impl Config {
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if let Some(path) = &cli.credentials {
            self.credentials_path = path.clone();
        }
        if let Some(path) = &cli.token {
            self.token_path = path.clone();
        }
        if let Some(query) = &cli.query {
            self.search_query = query.clone();
        }
        if let Some(secs) = cli.settle_secs {
            self.settle_secs = secs;
        }
        if let Some(secs) = cli.pace_secs {
            self.pace_secs = secs;
        }
        self
    }

    pub fn probe_settings(&self) -> ProbeSettings {
        ProbeSettings {
            search_query: self.search_query.clone(),
            max_results: self.max_results,
            reply_subject: self.reply_subject.clone(),
            settle: Duration::from_secs(self.settle_secs),
            pace: Duration::from_secs(self.pace_secs),
        }
    }
}

/// Load settings from `config_path`. A missing file yields the defaults.
pub fn load_config(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        debug!("No settings file at {:?}; using defaults", config_path);
        return Ok(Config::default());
    }

    debug!("Loading configuration from {:?}", config_path);

    let content = fs::read_to_string(config_path).map_err(|e| {
        error!("Failed to read config file {}: {}", config_path.display(), e);
        eyre!("Failed to read config file {}: {}", config_path.display(), e)
    })?;

    // an empty file parses as YAML null
    if content.trim().is_empty() {
        return Ok(Config::default());
    }

    let cfg: Config = serde_yaml::from_str(&content).map_err(|e| {
        error!("Failed to parse YAML: {}", e);
        eyre!("Failed to parse YAML: {}", e)
    })?;

    debug!("Successfully loaded configuration");
    Ok(cfg)
}
