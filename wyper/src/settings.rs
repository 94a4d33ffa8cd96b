use std::{
    env,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, File};
use log::debug;
use serde::Deserialize;

use crate::cli::Args;
use crate::models::post::DEFAULT_IMAGE_BASE;
use crate::services::chat::DEFAULT_POLL_INTERVAL;

pub const DEFAULT_API_URL: &str = "http://localhost:7894/api";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const CONFIG_FILE_NAME: &str = env!("CARGO_PKG_NAME");

/// What `config.toml` may set. Every field is optional.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct FileSettings {
    pub api_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub poll_interval_ms: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub image_base: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    pub data_dir: PathBuf,
    pub poll_interval: Duration,
    pub request_timeout: Duration,
    pub image_base: String,
}

fn get_xdg_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config));
    }

    if let Ok(home) = env::var("HOME") {
        return Some(PathBuf::from(home).join(".config"));
    }

    None
}

fn default_data_dir() -> PathBuf {
    if let Ok(xdg_data) = env::var("XDG_DATA_HOME") {
        return PathBuf::from(xdg_data).join(CONFIG_FILE_NAME);
    }

    if let Ok(home) = env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(CONFIG_FILE_NAME);
    }

    PathBuf::from(format!(".{CONFIG_FILE_NAME}"))
}

pub fn load_file_settings(config_path: &Path) -> anyhow::Result<FileSettings> {
    if !config_path.exists() {
        return Ok(FileSettings::default());
    }

    Config::builder()
        .add_source(File::from(config_path).required(false))
        .build()?
        .try_deserialize()
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to deserialize config file {}: {}",
                config_path.display(),
                e
            )
        })
}

/// Command line (and environment) first, then the config file, then defaults.
pub fn resolve(args: &Args, file: FileSettings) -> Settings {
    Settings {
        api_url: args
            .api_url
            .clone()
            .or(file.api_url)
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
        data_dir: args
            .data_dir
            .clone()
            .or(file.data_dir)
            .unwrap_or_else(default_data_dir),
        poll_interval: args
            .poll_interval_ms
            .or(file.poll_interval_ms)
            .map_or(DEFAULT_POLL_INTERVAL, Duration::from_millis),
        request_timeout: args
            .timeout_secs
            .or(file.request_timeout_secs)
            .map_or(DEFAULT_TIMEOUT, Duration::from_secs),
        image_base: args
            .image_base
            .clone()
            .or(file.image_base)
            .unwrap_or_else(|| DEFAULT_IMAGE_BASE.to_string()),
    }
}

pub fn merge_settings_with_args(args: &Args) -> anyhow::Result<Settings> {
    let file = match get_xdg_config_path() {
        Some(xdg_config) => {
            load_file_settings(&xdg_config.join(CONFIG_FILE_NAME).join("config.toml"))?
        }
        None => FileSettings::default(),
    };

    let settings = resolve(args, file);
    debug!("merged settings: {:?}", settings);

    Ok(settings)
}
