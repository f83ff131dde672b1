//! `ConfigLoader` (SPEC_FULL §B.2): hierarchical merge of defaults, an
//! optional `auditor.yaml`, and `AUDITOR_`-prefixed environment
//! variables, modeled on the teacher's `ConfigLoader::load` /
//! `ConfigLoader::validate` split.

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::AuditorConfig;

/// Configuration validation failures. 0 is a meaningful sentinel for
/// `bookie_check_interval_secs` (§4.5) and is deliberately not
/// rejected here — only resource bounds that can never legitimately be
/// zero are.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("metadata_store.endpoints must not be empty")]
    EmptyMetadataStoreEndpoints,

    #[error("metadata_store.connect_timeout_ms must be at least 1")]
    InvalidConnectTimeout,

    #[error("under_replication_root must not be empty")]
    EmptyUnderReplicationRoot,

    #[error("logging.level '{0}' is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("logging.format '{0}' is not one of json, pretty")]
    InvalidLogFormat(String),
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (`AuditorConfig::default()`)
    /// 2. `auditor.yaml` in the current directory (optional)
    /// 3. `AUDITOR_`-prefixed environment variables, nested keys
    ///    separated by `__` (e.g. `AUDITOR_METADATA_STORE__CONNECT_TIMEOUT_MS`)
    pub fn load() -> Result<AuditorConfig> {
        let config: AuditorConfig = Figment::new()
            .merge(Serialized::defaults(AuditorConfig::default()))
            .merge(Yaml::file("auditor.yaml"))
            .merge(Env::prefixed("AUDITOR_").split("__"))
            .extract()
            .context("failed to extract Auditor configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load from a specific YAML file, bypassing environment overrides
    /// and the default `auditor.yaml` lookup. Used by tests and by
    /// `check-once` CLI invocations that pin an exact config.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<AuditorConfig> {
        let config: AuditorConfig = Figment::new()
            .merge(Serialized::defaults(AuditorConfig::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .context(format!("failed to load Auditor config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn validate(config: &AuditorConfig) -> Result<(), ConfigError> {
        if config.metadata_store.endpoints.is_empty() {
            return Err(ConfigError::EmptyMetadataStoreEndpoints);
        }
        if config.metadata_store.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidConnectTimeout);
        }
        if config.under_replication_root.is_empty() {
            return Err(ConfigError::EmptyUnderReplicationRoot);
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        let config = AuditorConfig::default();
        ConfigLoader::validate(&config).expect("default config should be valid");
    }

    #[test]
    fn zero_bookie_check_interval_is_not_a_validation_error() {
        let config = AuditorConfig {
            bookie_check_interval_secs: 0,
            ..Default::default()
        };
        ConfigLoader::validate(&config).expect("0 is a meaningful sentinel, not invalid");
    }

    #[test]
    fn rejects_empty_metadata_store_endpoints() {
        let mut config = AuditorConfig::default();
        config.metadata_store.endpoints.clear();
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyMetadataStoreEndpoints));
    }

    #[test]
    fn rejects_zero_connect_timeout() {
        let mut config = AuditorConfig::default();
        config.metadata_store.connect_timeout_ms = 0;
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConnectTimeout));
    }

    #[test]
    fn rejects_invalid_log_level() {
        let mut config = AuditorConfig::default();
        config.logging.level = "verbose".to_string();
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogLevel(_)));
    }

    #[test]
    fn rejects_invalid_log_format() {
        let mut config = AuditorConfig::default();
        config.logging.format = "xml".to_string();
        let err = ConfigLoader::validate(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLogFormat(_)));
    }

    #[test]
    fn yaml_file_overrides_defaults() {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "bookie_check_interval_secs: 120\nunder_replication_root: /custom/root").unwrap();
        file.flush().unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.bookie_check_interval_secs, 120);
        assert_eq!(config.under_replication_root, "/custom/root");
        // Unset keys keep their defaults.
        assert_eq!(config.ledger_check_interval_secs, 21_600);
    }
}
