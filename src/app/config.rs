// src/app/config.rs
//
// Runtime configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub const ENV_API_URL: &str = "F1INSIGHT_API_URL";
pub const ENV_DATA_DIR: &str = "F1INSIGHT_DATA_DIR";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "F1INSIGHT_HTTP_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Backend base URL, including the `/api` prefix.
    pub api_url: String,
    /// Overrides the platform data directory for the database.
    pub data_dir: Option<PathBuf>,
    pub http_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            data_dir: None,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from any variable source. Unset or blank values keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();

        if let Some(url) = get(ENV_API_URL) {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(AppError::Config(format!(
                    "{} must be an http(s) URL, got {}",
                    ENV_API_URL, url
                )));
            }
            config.api_url = url.trim_end_matches('/').to_string();
        }

        config.data_dir = get(ENV_DATA_DIR).map(PathBuf::from);

        if let Some(secs) = get(ENV_HTTP_TIMEOUT_SECS) {
            let secs: u64 = secs.parse().map_err(|_| {
                AppError::Config(format!("{} must be a number of seconds", ENV_HTTP_TIMEOUT_SECS))
            })?;
            if secs == 0 {
                return Err(AppError::Config(format!(
                    "{} must be greater than zero",
                    ENV_HTTP_TIMEOUT_SECS
                )));
            }
            config.http_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.api_url, "http://localhost:5000/api");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_API_URL, "https://f1.example.com/api/"),
            (ENV_DATA_DIR, "/tmp/f1"),
            (ENV_HTTP_TIMEOUT_SECS, "5"),
        ]))
        .unwrap();

        assert_eq!(config.api_url, "https://f1.example.com/api");
        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/f1")));
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(ENV_HTTP_TIMEOUT_SECS, "soon")])),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(ENV_HTTP_TIMEOUT_SECS, "0")])),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            AppConfig::from_lookup(lookup(&[(ENV_API_URL, "localhost:5000")])),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = AppConfig::from_lookup(lookup(&[(ENV_API_URL, "  ")])).unwrap();
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
