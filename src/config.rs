//! Configuration handling for the claim form

use crate::validation::CheckTiming;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default base URL of the catalog and user directory
pub const DEFAULT_API_BASE: &str = "https://dummyjson.com";

/// Environment variable overriding `api_base`
pub const API_BASE_ENV: &str = "CLAIM_FORM_API_BASE";

/// User configuration for the form
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FormConfig {
    /// Base URL for `/products/categories` and `/users/search`
    pub api_base: Option<String>,
    /// Quiet period before an email uniqueness check fires
    pub debounce_ms: Option<u64>,
    /// Upper bound for a single remote request
    pub request_timeout_secs: Option<u64>,
}

impl FormConfig {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("cz", "claims", "claim-form")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Load configuration from file, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: FormConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    /// Base URL: environment first, then file, then the public default
    pub fn api_base(&self) -> String {
        let base = std::env::var(API_BASE_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .or_else(|| self.api_base.clone())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        base.trim_end_matches('/').to_string()
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(CheckTiming::default().timeout)
    }

    pub fn timing(&self) -> CheckTiming {
        CheckTiming {
            debounce: self
                .debounce_ms
                .map(Duration::from_millis)
                .unwrap_or(CheckTiming::default().debounce),
            timeout: self.request_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FormConfig::default();
        assert!(config.api_base.is_none());
        assert!(config.debounce_ms.is_none());
        assert!(config.request_timeout_secs.is_none());
    }

    #[test]
    fn test_default_timing() {
        let timing = FormConfig::default().timing();
        assert_eq!(timing.debounce, Duration::from_millis(500));
        assert_eq!(timing.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_timing_overrides() {
        let config = FormConfig {
            debounce_ms: Some(250),
            request_timeout_secs: Some(3),
            ..Default::default()
        };
        let timing = config.timing();
        assert_eq!(timing.debounce, Duration::from_millis(250));
        assert_eq!(timing.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_api_base_from_file_value_strips_trailing_slash() {
        // Only meaningful when the override variable is unset
        if std::env::var(API_BASE_ENV).is_ok() {
            return;
        }
        let config = FormConfig {
            api_base: Some("http://localhost:8080/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_base(), "http://localhost:8080");
        assert_eq!(FormConfig::default().api_base(), DEFAULT_API_BASE);
    }

    #[test]
    fn test_partial_serialization() {
        let config = FormConfig {
            debounce_ms: Some(800),
            ..Default::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        let parsed: FormConfig = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.debounce_ms, Some(800));
        assert!(parsed.api_base.is_none());
    }

    #[test]
    fn test_deserialize_with_extra_fields() {
        // Should ignore unknown fields
        let json = r#"{"debounce_ms": 300, "unknown_field": "value"}"#;
        let parsed: FormConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.debounce_ms, Some(300));
    }

    #[test]
    fn test_load_from_reports_bad_json() {
        let path = std::env::temp_dir().join(format!("claim-form-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, "{ not json").unwrap();
        let result = FormConfig::load_from(&path);
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_load_returns_ok_when_no_file() {
        let result = FormConfig::load();
        assert!(result.is_ok());
    }
}
