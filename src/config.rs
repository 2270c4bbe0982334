use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::aggregate::DEFAULT_PRECISION;
use crate::audio::analysis::DEFAULT_WINDOW_DURATION;
use crate::audio::features::MAX_PRECISION;

#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    #[serde(default = "default_window_duration")]
    pub window_duration: f32,
    #[serde(default = "default_max_duration")]
    pub max_duration: f32,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct OutputConfig {
    #[serde(default = "default_precision")]
    pub precision: u32,
    #[serde(default)]
    pub pretty: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            window_duration: default_window_duration(),
            max_duration: default_max_duration(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            precision: default_precision(),
            pretty: false,
        }
    }
}

pub fn default_sample_rate() -> u32 { 22050 }
pub fn default_window_duration() -> f32 { DEFAULT_WINDOW_DURATION }
pub fn default_max_duration() -> f32 { 600.0 }
pub fn default_precision() -> u32 { DEFAULT_PRECISION }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str::<Config>(&content) {
        Ok(mut cfg) => {
            if cfg.output.precision > MAX_PRECISION {
                log::warn!(
                    "Config {}: precision {} exceeds {}, clamping",
                    path.display(),
                    cfg.output.precision,
                    MAX_PRECISION
                );
                cfg.output.precision = MAX_PRECISION;
            }
            Some(cfg)
        }
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

/// Explicit path, else `neurosonic.toml` in the working directory, else the
/// user config directories.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("neurosonic.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("neurosonic").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("neurosonic").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}
