//! Configuration loading for the clusters checker CLI.

use anyhow::{Context, Result};
use cc_core::{EnvironmentRegistry, ScanConfig, DEFAULT_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Extra or overriding environments, name to gateway URL.
    #[serde(default)]
    pub environments: BTreeMap<String, String>,

    /// Discovery tuning.
    #[serde(default)]
    pub scan: ScanSettings,

    /// Report delivery.
    #[serde(default)]
    pub notification: NotificationSettings,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl AppConfig {
    /// Loads configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Loads `path` if it exists, otherwise returns the defaults.
    ///
    /// A file that exists but cannot be parsed is still an error.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Built-in environments with the configured overrides applied.
    pub fn registry(&self) -> EnvironmentRegistry {
        self.environments
            .iter()
            .fold(EnvironmentRegistry::builtin(), |registry, (name, url)| {
                registry.with_entry(name.as_str(), url.as_str())
            })
    }

    /// Scan tuning as consumed by the discovery pipeline.
    pub fn scan_config(&self) -> ScanConfig {
        ScanConfig::default()
            .with_page_size(self.scan.page_size)
            .with_max_concurrency(self.scan.max_concurrency)
            .with_max_age_hours(self.scan.max_age_hours)
    }
}

/// Discovery tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Clusters requested per inventory page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Maximum cluster evaluations in flight.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Age in hours past which a cluster is stale.
    #[serde(default = "default_max_age_hours")]
    pub max_age_hours: u32,

    /// Timeout in seconds for each OCM and Slack request.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_max_concurrency() -> usize {
    DEFAULT_PAGE_SIZE as usize
}

fn default_max_age_hours() -> u32 {
    24
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            max_concurrency: default_max_concurrency(),
            max_age_hours: default_max_age_hours(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Report delivery settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationSettings {
    /// Slack channel used when `--slack-channel-id` is not given.
    #[serde(default)]
    pub default_channel: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Whether to use JSON format.
    #[serde(default)]
    pub json_format: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        let scan = config.scan_config();
        assert_eq!(scan.page_size, 100);
        assert_eq!(scan.max_concurrency, 100);
        assert_eq!(scan.max_age.num_hours(), 24);
        assert_eq!(config.scan.request_timeout_secs, 30);
        assert!(config.notification.default_channel.is_none());
        assert_eq!(
            config.registry().names(),
            vec!["integration", "production", "staging"]
        );
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
environments:
  staging: https://staging.internal
  local: http://localhost:8000

scan:
  page_size: 50
  max_age_hours: 48
  request_timeout_secs: 10

notification:
  default_channel: C0123
"#;

        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        let registry = config.registry();
        assert_eq!(registry.url("staging"), Some("https://staging.internal"));
        assert_eq!(registry.url("local"), Some("http://localhost:8000"));
        assert_eq!(registry.url("production"), Some("https://api.openshift.com"));

        let scan = config.scan_config();
        assert_eq!(scan.page_size, 50);
        assert_eq!(scan.max_concurrency, 100);
        assert_eq!(scan.max_age.num_hours(), 48);
        assert_eq!(config.scan.request_timeout_secs, 10);
        assert_eq!(config.notification.default_channel.as_deref(), Some("C0123"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "logging:\n  json_format: true").unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config.scan.page_size, 100);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "scan: [not, a, map]").unwrap();

        let err = AppConfig::load_or_default(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
