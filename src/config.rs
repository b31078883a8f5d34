//! Configuration management for the model manager using the prefer crate.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::services::catalog::{CatalogError, CatalogStore};
use crate::services::coordinator::{OperationCoordinator, DEFAULT_STEP_DELAY};
use crate::services::progress_log::ProgressLog;
use crate::services::transfer::{WgetDownloader, DEFAULT_DOWNLOADER};

/// Published catalog of model packages.
pub const DEFAULT_CATALOG_URL: &str =
    "https://raw.githubusercontent.com/hgabha/scripts/refs/heads/main/model_configs.json";

/// Default models directory of a ComfyUI install.
pub const DEFAULT_BASE_PATH: &str = "/workspace/ComfyUI/models";

/// Default listen address for the web server.
pub const DEFAULT_BIND: &str = "0.0.0.0:9999";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
}

/// Application settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Catalog source: `http(s)://` URL or local JSON file.
    pub catalog_url: String,
    /// Default base directory shown in the UI and used by the CLI.
    pub base_path: PathBuf,
    /// Web server bind address.
    pub bind: String,
    /// Downloader binary name or path.
    pub downloader: String,
    /// Advisory progress log file.
    pub progress_log: PathBuf,
    /// Pause between files in milliseconds.
    pub step_delay_ms: u64,
    /// Catalog fetch timeout in seconds.
    pub request_timeout: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog_url: DEFAULT_CATALOG_URL.to_string(),
            base_path: PathBuf::from(DEFAULT_BASE_PATH),
            bind: DEFAULT_BIND.to_string(),
            downloader: DEFAULT_DOWNLOADER.to_string(),
            progress_log: ProgressLog::default().path().to_path_buf(),
            step_delay_ms: DEFAULT_STEP_DELAY.as_millis() as u64,
            request_timeout: 10,
        }
    }
}

impl Settings {
    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    pub fn downloader(&self) -> WgetDownloader {
        WgetDownloader::new(&self.downloader)
    }

    /// Build the batch coordinator for these settings.
    pub fn create_coordinator(&self) -> OperationCoordinator {
        OperationCoordinator::new(
            Arc::new(self.downloader()),
            ProgressLog::new(&self.progress_log),
        )
        .with_step_delay(self.step_delay())
    }

    /// Build an empty catalog store pointing at the configured source.
    pub fn create_catalog(&self) -> Result<CatalogStore, CatalogError> {
        CatalogStore::new(&self.catalog_url, self.request_timeout())
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, prefer::FromValue)]
pub struct Config {
    /// Catalog URL or file path.
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "config_url")]
    pub catalog_url: Option<String>,
    /// Default base path for model files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    /// Web server bind address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    /// Downloader binary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub downloader: Option<String>,
    /// Progress log path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_log: Option<String>,
    /// Pause between files in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_delay_ms: Option<u64>,
    /// Catalog fetch timeout in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout: Option<u64>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    #[prefer(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    /// Automatically discovers model-manager config files in standard locations.
    pub async fn load() -> Self {
        match prefer::load("model-manager").await {
            Ok(pref_config) => {
                if let Some(path) = pref_config.source_path() {
                    match Self::load_from_path(path).await {
                        Ok(config) => config,
                        Err(e) => {
                            tracing::warn!("Ignoring config file: {}", e);
                            Self::default()
                        }
                    }
                } else {
                    Self::default()
                }
            }
            Err(_) => Self::default(),
        }
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            })?,
            "yaml" | "yml" => serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            })?,
            _ => serde_json::from_str(&contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            })?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref url) = self.catalog_url {
            settings.catalog_url = if url.contains("://") {
                url.clone()
            } else {
                self.resolve_path(url, base_dir).to_string_lossy().to_string()
            };
        }
        if let Some(ref base_path) = self.base_path {
            settings.base_path = self.resolve_path(base_path, base_dir);
        }
        if let Some(ref bind) = self.bind {
            settings.bind = bind.clone();
        }
        if let Some(ref downloader) = self.downloader {
            settings.downloader = downloader.clone();
        }
        if let Some(ref log) = self.progress_log {
            settings.progress_log = self.resolve_path(log, base_dir);
        }
        if let Some(delay) = self.step_delay_ms {
            settings.step_delay_ms = delay;
        }
        if let Some(timeout) = self.request_timeout {
            settings.request_timeout = timeout;
        }
    }
}

/// Options controlling how settings are loaded.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file (skips discovery).
    pub config_path: Option<PathBuf>,
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub async fn load_settings_with_options(
    options: LoadOptions,
) -> Result<(Settings, Config), ConfigError> {
    let config = match options.config_path {
        Some(ref path) => Config::load_from_path(path).await?,
        None => Config::load().await,
    };

    let base_dir = config
        .base_dir()
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);
    apply_env_overrides(&mut settings);

    Ok((settings, config))
}

/// Environment variables take precedence over the config file.
fn apply_env_overrides(settings: &mut Settings) {
    if let Some(url) = env_value("MODEL_MANAGER_CATALOG_URL") {
        tracing::debug!("Using MODEL_MANAGER_CATALOG_URL from environment: {}", url);
        settings.catalog_url = url;
    }
    if let Some(path) = env_value("MODEL_MANAGER_BASE_PATH") {
        settings.base_path = PathBuf::from(shellexpand::tilde(&path).as_ref());
    }
    if let Some(bind) = env_value("MODEL_MANAGER_BIND") {
        settings.bind = bind;
    }
    if let Some(downloader) = env_value("MODEL_MANAGER_DOWNLOADER") {
        settings.downloader = downloader;
    }
}

fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}
