use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::config::schema::Config;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file contains invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),
}

/// Loads configuration from defaults, the config file and the environment
///
/// CLI flags are applied afterwards by the caller, so they take precedence
/// over everything loaded here.
pub fn load_config(cli_config_path: Option<PathBuf>) -> Result<Config> {
    tracing::debug!("Loading configuration");

    let mut config = Config::default();

    // Layer 1: config file (~/.avatargen/config.json)
    let config_file = cli_config_path.clone().or_else(get_default_config_path);

    if let Some(ref path) = config_file {
        if path.exists() {
            tracing::debug!(config_path = %path.display(), "Loading configuration from file");
            config = load_config_file(path)?;
        } else if cli_config_path.is_some() {
            tracing::warn!(config_path = %path.display(), "Config file not found, using defaults");
        } else {
            tracing::debug!(config_path = %path.display(), "Config file not found, using defaults");
        }
    }

    // Layer 2: environment variables override
    tracing::debug!("Applying environment variable overrides");
    config = merge_env_variables(config, |key| std::env::var(key).ok());

    tracing::debug!(
        base_url = %config.base_url,
        output_dir = %config.output_dir.display(),
        expires_in_days = config.expires_in_days,
        tracking_file = %config.tracking_file.display(),
        robot_set = %config.robot_set,
        timeout_secs = config.timeout_secs,
        "Configuration loaded successfully"
    );

    Ok(config)
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".avatargen").join("config.json"))
}

fn load_config_file(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .map_err(ConfigError::IoError)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = serde_json::from_str(&content)
        .map_err(ConfigError::InvalidJson)
        .with_context(|| format!("Invalid config file: {:?}", path))?;

    Ok(config)
}

/// Applies `AVATARGEN_*` overrides read through `lookup`
///
/// Empty values are ignored, as are values that fail to parse (with a warning).
fn merge_env_variables<F>(config: Config, lookup: F) -> Config
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    let robot_set = match get("AVATARGEN_SET") {
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!("Ignoring AVATARGEN_SET: {}", e);
            config.robot_set
        }),
        None => config.robot_set,
    };

    let timeout_secs = match get("AVATARGEN_TIMEOUT_SECS") {
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                tracing::warn!(value = %raw, "Ignoring invalid AVATARGEN_TIMEOUT_SECS");
                config.timeout_secs
            }
        },
        None => config.timeout_secs,
    };

    Config {
        base_url: get("AVATARGEN_BASE_URL").unwrap_or(config.base_url),
        output_dir: get("AVATARGEN_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(config.output_dir),
        expires_in_days: config.expires_in_days,
        tracking_file: get("AVATARGEN_TRACKING_FILE")
            .map(PathBuf::from)
            .unwrap_or(config.tracking_file),
        robot_set,
        timeout_secs,
    }
}
