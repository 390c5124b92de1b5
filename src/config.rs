use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use clap::Parser;
use figment::{
    Figment,
    providers::{Format, Json, Serialized, Toml, Yaml},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::cli::CliArgs;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Upper bound on keywords searched per interview
pub const MAX_KEYWORDS: usize = 5;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct SearchConfig {
    /// RapidAPI key
    pub api_key: Option<String>,
    /// Value of the `X-RapidAPI-Host` header
    pub api_host: String,
    pub base_url: String,
    /// Country code sent with every search
    pub region: String,
    /// Products kept per keyword
    pub max_results: usize,
    /// Attempts per search when rate limited
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GeminiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct InterviewConfig {
    /// Keywords searched per interview
    pub max_keywords: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub server: ServerConfig,
    pub search: SearchConfig,
    pub gemini: GeminiConfig,
    pub interview: InterviewConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3333,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_host: "real-time-amazon-data.p.rapidapi.com".to_string(),
            base_url: "https://real-time-amazon-data.p.rapidapi.com".to_string(),
            region: "US".to_string(),
            max_results: 10,
            max_retries: 3,
            base_delay_ms: 2000,
            timeout_secs: 30,
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-1.5-flash-001".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            max_keywords: MAX_KEYWORDS,
        }
    }
}

fn config_file(figment: Figment, path: &Path) -> Result<Figment> {
    let figment = match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
        _ => bail!("Cannot identify config file type. Must be .toml, .json or .yaml"),
    };
    Ok(figment)
}

/// Defaults, then the config file, then CLI/env overrides.
pub(crate) fn figment(args: CliArgs) -> Result<Figment> {
    let defaults = json!({
        "server": ServerConfig::default(),
        "search": SearchConfig::default(),
        "gemini": GeminiConfig::default(),
        "interview": InterviewConfig::default(),
    });

    let mut figment = Figment::new().merge(Serialized::defaults(defaults));

    let config_path = PathBuf::from(
        args.config
            .clone()
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string()),
    );

    if config_path.exists() {
        log::info!("Config file found: {}", config_path.display());
        figment = config_file(figment, &config_path)?;
    } else if config_path.to_str() != Some(DEFAULT_CONFIG_PATH) {
        bail!("Config file not found: {}", config_path.display());
    }

    Ok(figment.merge(Serialized::defaults(args.as_overrides())))
}

fn validate(config: &Config) -> Result<()> {
    if !(1..=MAX_KEYWORDS).contains(&config.interview.max_keywords) {
        bail!(
            "interview.max_keywords must be between 1 and {}, got {}",
            MAX_KEYWORDS,
            config.interview.max_keywords
        );
    }
    Ok(())
}

pub fn load_config() -> Result<Config> {
    log::debug!("Parsing CLI args...");
    let config: Config = figment(CliArgs::parse())?.extract()?;
    validate(&config)?;

    log::debug!(
        "Loaded config: server={:?} search.region={} search.max_results={} gemini.model={}",
        config.server,
        config.search.region,
        config.search.max_results,
        config.gemini.model
    );

    Ok(config)
}
