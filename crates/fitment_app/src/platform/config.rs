use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use fitment_engine::{ApiSettings, PollSettings};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILENAME: &str = "fitment.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub poll_interval_ms: u64,
    /// Cap for backoff after failed reads; equal to `poll_interval_ms` disables it.
    pub max_poll_interval_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub report_path: String,
    /// Pause between the success message and opening the report.
    pub report_delay_ms: u64,
    pub log_to_file: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            poll_interval_ms: 1000,
            max_poll_interval_ms: 1000,
            connect_timeout_ms: 5000,
            request_timeout_ms: 10_000,
            report_path: "/summary".to_string(),
            report_delay_ms: 800,
            log_to_file: false,
        }
    }
}

impl AppConfig {
    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn poll_settings(&self) -> PollSettings {
        PollSettings {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_interval: Duration::from_millis(self.max_poll_interval_ms.max(self.poll_interval_ms)),
        }
    }

    pub fn report_delay(&self) -> Duration {
        Duration::from_millis(self.report_delay_ms)
    }

    pub fn report_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            self.report_path.trim_start_matches('/')
        )
    }
}

/// Loads the config file.
///
/// An explicitly requested file must exist. Without one, `fitment.ron` in the
/// working directory is used when present and defaults otherwise.
/// Configuration together with the file it was read from, if any.
#[derive(Debug)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub source: Option<PathBuf>,
}

pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let path = explicit.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILENAME), Path::to_path_buf);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound && explicit.is_none() => {
            return Ok(LoadedConfig {
                config: AppConfig::default(),
                source: None,
            });
        }
        Err(source) => return Err(ConfigError::Read { path, source }),
    };

    let config: AppConfig = ron::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.clone(),
        message: err.to_string(),
    })?;
    Ok(LoadedConfig {
        config,
        source: Some(path),
    })
}
