//! Configuration management for the dashboard client.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::warn;
use url::Url;

/// Default backend API URL (can be overridden at compile time via FINWATCH_API_URL env var).
pub const DEFAULT_API_URL: &str = match option_env!("FINWATCH_API_URL") {
    Some(url) => url,
    None => "http://localhost:8000/api",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Upper bound on how long queued requests wait for a token refresh.
pub const DEFAULT_REFRESH_TIMEOUT_MS: u64 = 10_000;

/// Per-request timeout for ordinary API calls.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Main client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default tracing filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Base URL of the monitoring backend REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Refresh call timeout in milliseconds.
    #[serde(default = "default_refresh_timeout_ms")]
    pub refresh_timeout_ms: u64,
    /// Request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_refresh_timeout_ms() -> u64 {
    DEFAULT_REFRESH_TIMEOUT_MS
}

fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            api_url: default_api_url(),
            refresh_timeout_ms: DEFAULT_REFRESH_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Load configuration from the config file, falling back to defaults,
    /// then apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.load_from_env();
        config.validate()?;

        Ok(config)
    }

    /// Read a config file without applying env overrides.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn load_from_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply `FINWATCH_*` overrides from the given lookup.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(log_level) = lookup("FINWATCH_LOG_LEVEL") {
            self.log_level = log_level;
        }
        if let Some(api_url) = lookup("FINWATCH_API_URL") {
            self.api_url = api_url.trim_end_matches('/').to_string();
        }
        if let Some(raw) = lookup("FINWATCH_REFRESH_TIMEOUT_MS") {
            match raw.trim().parse() {
                Ok(timeout) => self.refresh_timeout_ms = timeout,
                Err(_) => warn!(value = %raw, "Ignoring non-numeric FINWATCH_REFRESH_TIMEOUT_MS"),
            }
        }
    }

    /// Reject values the gateway cannot work with.
    pub fn validate(&self) -> CoreResult<()> {
        self.api_url()?;
        for (name, value) in [
            ("refresh_timeout_ms", self.refresh_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ] {
            if value == 0 {
                return Err(CoreError::Config(format!("{} must be greater than zero", name)));
            }
        }
        Ok(())
    }

    /// Get the API URL as a parsed URL.
    pub fn api_url(&self) -> CoreResult<Url> {
        Url::parse(&self.api_url).map_err(CoreError::from)
    }

    /// Refresh timeout as a `Duration`.
    pub fn refresh_timeout(&self) -> Duration {
        Duration::from_millis(self.refresh_timeout_ms)
    }

    /// Request timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_default_timeouts() {
        let config = Config::default();
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.refresh_timeout(), Duration::from_secs(10));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_config_load_from_file_fills_missing_fields() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.json");

        std::fs::write(&config_path, r#"{ "log_level": "debug" }"#).unwrap();

        let config = Config::load_from_file(&config_path).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.refresh_timeout_ms, DEFAULT_REFRESH_TIMEOUT_MS);
    }

    #[test]
    fn test_written_config_reloads() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        let config = Config {
            api_url: "https://farm.example.com/api".to_string(),
            refresh_timeout_ms: 2_500,
            ..Config::default()
        };
        std::fs::write(
            paths.config_file(),
            serde_json::to_string_pretty(&config).unwrap(),
        )
        .unwrap();

        let loaded = Config::load_from_file(&paths.config_file()).unwrap();
        assert_eq!(loaded.api_url, "https://farm.example.com/api");
        assert_eq!(loaded.refresh_timeout_ms, 2_500);
    }

    #[test]
    fn test_overrides_apply_and_ignore_blank_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FINWATCH_API_URL", "https://override.example.com/api/"),
            ("FINWATCH_LOG_LEVEL", "  "),
            ("FINWATCH_REFRESH_TIMEOUT_MS", "1500"),
        ]);

        let mut config = Config::default();
        config.apply_overrides(|name| env.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_url, "https://override.example.com/api");
        assert_eq!(config.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.refresh_timeout_ms, 1500);
    }

    #[test]
    fn test_unparseable_timeout_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|name| {
            (name == "FINWATCH_REFRESH_TIMEOUT_MS").then(|| "soon".to_string())
        });
        assert_eq!(config.refresh_timeout_ms, DEFAULT_REFRESH_TIMEOUT_MS);
    }

    #[test]
    fn test_rejects_unparseable_api_url() {
        let config = Config {
            api_url: "not a valid url".to_string(),
            ..Config::default()
        };
        assert!(config.api_url().is_err());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_refresh_timeout_rejected() {
        let config = Config {
            refresh_timeout_ms: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_zero_request_timeout_rejected() {
        let config = Config {
            request_timeout_ms: 0,
            ..Config::default()
        };
        match config.validate() {
            Err(CoreError::Config(message)) => assert!(message.contains("request_timeout_ms")),
            other => panic!("expected config error, got {:?}", other),
        }
    }
}
