use anyhow::{Context, Result, anyhow, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::Arc, time::Duration};

use crate::{
    geolocation::{PositionOptions, PositionSource, StaticPositionSource},
    http::ApiConfig,
    model::Coordinates,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const BASE_URL_ENV: &str = "WEATHER_API_BASE_URL";
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

/// Upstream API endpoint and credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
        }
    }
}

/// How long to wait for the device position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationSettings {
    pub device_timeout_secs: u64,
    pub maximum_age_secs: u64,
    pub high_accuracy: bool,
    /// Outer deadline racing the device request.
    pub deadline_secs: u64,
}

impl Default for GeolocationSettings {
    fn default() -> Self {
        Self {
            device_timeout_secs: 8,
            maximum_age_secs: 300,
            high_accuracy: false,
            deadline_secs: 10,
        }
    }
}

impl GeolocationSettings {
    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            timeout: Duration::from_secs(self.device_timeout_secs),
            maximum_age: Duration::from_secs(self.maximum_age_secs),
            enable_high_accuracy: self.high_accuracy,
        }
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [api]
/// api_key = "..."
///
/// [location]
/// lat = 50.45
/// lon = 30.52
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub api: ApiSettings,
    pub geolocation: GeolocationSettings,

    /// Fixed device position; without it the host has no position capability.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-widget", "weather-widget")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Apply `WEATHER_API_BASE_URL` / `WEATHER_API_KEY` on top of the file values.
    pub fn with_env(self) -> Self {
        self.with_overrides(
            std::env::var(BASE_URL_ENV).ok(),
            std::env::var(API_KEY_ENV).ok(),
        )
    }

    pub fn with_overrides(mut self, base_url: Option<String>, api_key: Option<String>) -> Self {
        if let Some(base_url) = base_url.filter(|s| !s.trim().is_empty()) {
            self.api.base_url = base_url;
        }
        if let Some(api_key) = api_key.filter(|s| !s.trim().is_empty()) {
            self.api.api_key = Some(api_key);
        }
        self
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api.api_key = Some(api_key);
    }

    /// HTTP client settings; fails if no API key is configured.
    pub fn api_config(&self) -> Result<ApiConfig> {
        let api_key = self
            .api
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                anyhow!(
                    "No API key configured.\n\
                     Hint: run `weather-widget configure` or set {API_KEY_ENV}."
                )
            })?;

        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            bail!("API base URL is empty.\nHint: set [api] base_url or {BASE_URL_ENV}.");
        }

        Ok(ApiConfig {
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_config().is_ok()
    }

    /// The device capability described by this config, if any.
    pub fn position_source(&self) -> Option<Arc<dyn PositionSource>> {
        let coordinates = self.location?;
        Some(Arc::new(StaticPositionSource::new(coordinates)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_config_errors_when_key_not_set() {
        let cfg = Config::default();
        let err = cfg.api_config().unwrap_err();

        assert!(err.to_string().contains("No API key configured"));
        assert!(err.to_string().contains("Hint: run `weather-widget configure`"));
        assert!(!cfg.is_configured());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let mut cfg = Config::default();
        cfg.set_api_key("   ".into());

        assert!(cfg.api_config().is_err());
    }

    #[test]
    fn api_config_uses_default_base_url() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());

        let api = cfg.api_config().expect("api config must exist");
        assert_eq!(api.base_url, DEFAULT_BASE_URL);
        assert_eq!(api.api_key, "KEY");
    }

    #[test]
    fn overrides_win_over_file_values() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        let cfg = cfg.with_overrides(Some("http://localhost:9000".into()), Some("ENV_KEY".into()));
        let api = cfg.api_config().unwrap();

        assert_eq!(api.base_url, "http://localhost:9000");
        assert_eq!(api.api_key, "ENV_KEY");
    }

    #[test]
    fn empty_overrides_are_ignored() {
        let mut cfg = Config::default();
        cfg.set_api_key("FILE_KEY".into());

        let cfg = cfg.with_overrides(Some(String::new()), Some(" ".into()));
        let api = cfg.api_config().unwrap();

        assert_eq!(api.base_url, DEFAULT_BASE_URL);
        assert_eq!(api.api_key, "FILE_KEY");
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let cfg: Config = toml::from_str(
            r#"
            [api]
            api_key = "abc"

            [geolocation]
            deadline_secs = 3

            [location]
            lat = 50.45
            lon = 30.52
            "#,
        )
        .unwrap();

        assert_eq!(cfg.api.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.api.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.geolocation.deadline(), Duration::from_secs(3));
        assert_eq!(cfg.geolocation.device_timeout_secs, 8);
        let expected = Coordinates {
            lat: 50.45,
            lon: 30.52,
        };
        assert_eq!(cfg.location, Some(expected));
        assert!(cfg.position_source().is_some());
    }

    #[test]
    fn toml_roundtrip() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.location = Some(Coordinates {
            lat: 1.0,
            lon: 2.0,
        });

        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed, cfg);
    }

    #[test]
    fn default_geolocation_matches_device_defaults() {
        let cfg = Config::default();

        assert_eq!(cfg.geolocation.position_options(), PositionOptions::default());
        assert_eq!(cfg.geolocation.deadline(), crate::geolocation::DEFAULT_DEADLINE);
        assert!(cfg.position_source().is_none());
    }
}
