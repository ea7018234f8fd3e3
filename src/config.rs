//! Configuration module
//!
//! Loaded from a TOML file (default `~/.config/event-broker/config.toml`).
//! Every field has a default, so an empty or missing file is valid.
//!
//! ```toml
//! [broker]
//! max_listeners = 20
//! metrics = false
//!
//! [logging]
//! level = "info"
//! format = "pretty"   # or "json"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::application::events::DEFAULT_MAX_LISTENERS;
use crate::domain::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub broker: BrokerConfig,
    pub logging: LoggingConfig,
}

/// Broker settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrokerConfig {
    /// Soft cap on listeners per kind before a leak warning; 0 disables it.
    pub max_listeners: usize,
    /// Feed publish/failure counters into the `metrics` facade.
    pub metrics: bool,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            max_listeners: DEFAULT_MAX_LISTENERS,
            metrics: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    pub level: String,
    /// `pretty` or `json`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }
}

pub fn default_config_path() -> PathBuf {
    dirs_next::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("event-broker")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.broker.max_listeners, 20);
        assert!(!cfg.broker.metrics);
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [broker]
            max_listeners = 50

            [logging]
            format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.broker.max_listeners, 50);
        assert!(!cfg.broker.metrics);
        assert_eq!(cfg.logging.format, "json");
        assert_eq!(cfg.logging.level, "info");
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = AppConfig::from_toml_str("[broker]\nmax_listeners = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_a_read_error_but_defaults_on_demand() {
        let path = std::env::temp_dir().join("event-broker-missing-config.toml");
        assert!(matches!(
            AppConfig::load(&path).unwrap_err(),
            ConfigError::Read { .. }
        ));
        assert_eq!(AppConfig::load_or_default(&path).unwrap(), AppConfig::default());
    }

    #[test]
    fn load_reads_file_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "event-broker-config-{}.toml",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, "[broker]\nmax_listeners = 0\nmetrics = true\n").unwrap();

        let cfg = AppConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(cfg.broker.max_listeners, 0);
        assert!(cfg.broker.metrics);
    }

    #[test]
    fn default_path_ends_with_app_dir() {
        let path = default_config_path();
        assert!(path.ends_with("event-broker/config.toml"));
    }
}
