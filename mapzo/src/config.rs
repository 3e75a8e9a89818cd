use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{AppError, AppResult};
use crate::sync::TogglePolicy;
use crate::validators::is_valid_url;

/// Configuration stored in `mapzo.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapzoConfig {
    #[serde(default)]
    pub app: AppSettings,
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub backend: BackendSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_lat")]
    pub default_lat: f64,
    #[serde(default = "default_lng")]
    pub default_lng: f64,
    #[serde(default = "default_zoom")]
    pub default_zoom: u8,
    /// Events per feed page load.
    #[serde(default = "default_feed_page_size")]
    pub feed_page_size: usize,
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
    #[serde(default = "default_map_event_limit")]
    pub map_event_limit: usize,
    #[serde(default = "default_max_upload_size_mb")]
    pub max_upload_size_mb: u64,
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,
    #[serde(default = "default_geolocation_timeout_ms")]
    pub geolocation_timeout_ms: u64,
    #[serde(default = "default_share_base_url")]
    pub share_base_url: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: default_name(),
            default_lat: default_lat(),
            default_lng: default_lng(),
            default_zoom: default_zoom(),
            feed_page_size: default_feed_page_size(),
            list_limit: default_list_limit(),
            map_event_limit: default_map_event_limit(),
            max_upload_size_mb: default_max_upload_size_mb(),
            toast_duration_ms: default_toast_duration_ms(),
            geolocation_timeout_ms: default_geolocation_timeout_ms(),
            share_base_url: default_share_base_url(),
        }
    }
}

fn default_name() -> String {
    "Mapzo".to_string()
}

fn default_lat() -> f64 {
    22.32
}

fn default_lng() -> f64 {
    87.315
}

fn default_zoom() -> u8 {
    14
}

fn default_feed_page_size() -> usize {
    10
}

fn default_list_limit() -> usize {
    30
}

fn default_map_event_limit() -> usize {
    50
}

fn default_max_upload_size_mb() -> u64 {
    10
}

fn default_toast_duration_ms() -> u64 {
    2500
}

fn default_geolocation_timeout_ms() -> u64 {
    8000
}

fn default_share_base_url() -> String {
    "https://mapzo.app/".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncSettings {
    #[serde(default)]
    pub toggle_policy: TogglePolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_backend_url")]
    pub url: String,
    #[serde(default = "default_anon_key")]
    pub anon_key: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            anon_key: default_anon_key(),
        }
    }
}

fn default_backend_url() -> String {
    "${MAPZO_BACKEND_URL}".to_string()
}

fn default_anon_key() -> String {
    "${MAPZO_ANON_KEY}".to_string()
}

impl BackendSettings {
    pub fn resolved_url(&self) -> AppResult<String> {
        expand_env(&self.url)
    }

    pub fn resolved_anon_key(&self) -> AppResult<String> {
        expand_env(&self.anon_key)
    }
}

/// Expands a whole-value `${VAR}` reference from the environment.
pub fn expand_env(value: &str) -> AppResult<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).map_err(|_| AppError::Config {
            message: format!("Environment variable {var_name} not set"),
        })
    } else {
        Ok(value.to_string())
    }
}

impl MapzoConfig {
    pub fn from_toml_str(content: &str) -> AppResult<Self> {
        let config: MapzoConfig = toml::from_str(content).map_err(|err| AppError::Config {
            message: format!("Failed to parse config: {err}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path`, or the defaults when the file does not exist.
    pub fn load(path: &Path) -> AppResult<Self> {
        if !path.exists() {
            log::debug!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|err| AppError::Config {
            message: format!("Failed to read {}: {err}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> AppResult<String> {
        toml::to_string_pretty(self).map_err(|err| AppError::Config {
            message: format!("Failed to serialize config: {err}"),
        })
    }

    pub fn validate(&self) -> AppResult<()> {
        let app = &self.app;
        if app.feed_page_size == 0 || app.list_limit == 0 || app.map_event_limit == 0 {
            return Err(AppError::Config {
                message: "page sizes must be greater than zero".to_string(),
            });
        }
        if !(-90.0..=90.0).contains(&app.default_lat) || !(-180.0..=180.0).contains(&app.default_lng) {
            return Err(AppError::Config {
                message: format!("default centre ({}, {}) is not a coordinate", app.default_lat, app.default_lng),
            });
        }
        if !is_valid_url(&app.share_base_url) {
            return Err(AppError::Config {
                message: format!("share_base_url {:?} is not a url", app.share_base_url),
            });
        }
        Ok(())
    }
}
