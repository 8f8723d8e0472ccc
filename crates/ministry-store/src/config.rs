//! Store configuration
//!
//! Loaded from YAML; `MINISTRY_BASE_URL` and `MINISTRY_API_KEY` override the
//! file so keys never need to be committed.

use ministry_records::RecordKind;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BASE_URL: &str = "MINISTRY_BASE_URL";
pub const ENV_API_KEY: &str = "MINISTRY_API_KEY";

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found '{0}'")]
    NotFound(PathBuf),

    #[error("failed to read config '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("missing setting: {0}")]
    Missing(&'static str),

    #[error("invalid base URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Backend table names per record kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableNames {
    pub donations: String,
    pub partnerships: String,
    pub gallery: String,
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            donations: "donations".to_string(),
            partnerships: "partnership_requests".to_string(),
            gallery: "gallery_images".to_string(),
        }
    }
}

impl TableNames {
    #[must_use]
    pub fn for_kind(&self, kind: RecordKind) -> &str {
        match kind {
            RecordKind::Donation => &self.donations,
            RecordKind::Partnership => &self.partnerships,
            RecordKind::Gallery => &self.gallery,
        }
    }
}

fn default_timeout_secs() -> u64 {
    10
}

/// Connection settings for the hosted backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub tables: TableNames,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            tables: TableNames::default(),
        }
    }
}

impl StoreConfig {
    /// Parse YAML text
    ///
    /// # Errors
    /// `ConfigError::Parse` on malformed YAML.
    pub fn from_yaml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load a config file, apply environment overrides and validate
    ///
    /// With `allow_missing`, an absent file yields defaults (environment
    /// variables may still supply everything).
    ///
    /// # Errors
    /// Read/parse failures and missing or invalid settings.
    pub fn load(path: &Path, allow_missing: bool) -> Result<Self, ConfigError> {
        let mut config = match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_yaml(&contents, path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound && allow_missing => {
                Self::default()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        config.apply_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Replace file values with non-empty values from `lookup`
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.trim().is_empty()) {
            self.base_url = url;
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.api_key = key;
        }
    }

    /// # Errors
    /// `ConfigError::Missing` or `ConfigError::InvalidBaseUrl`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(ConfigError::Missing("base_url"));
        }
        if !(url.starts_with("https://") || url.starts_with("http://")) {
            return Err(ConfigError::InvalidBaseUrl(url.to_string()));
        }
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Missing("api_key"));
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// Collection endpoint for a record kind
    #[must_use]
    pub fn collection_url(&self, kind: RecordKind) -> String {
        format!(
            "{}/rest/v1/{}",
            self.base_url.trim().trim_end_matches('/'),
            self.tables.for_kind(kind)
        )
    }
}

/// Default config file location (`~/.ministry-console/config.yml`)
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE"))?;
    Some(PathBuf::from(home).join(".ministry-console").join("config.yml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn loads_yaml_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url: https://abc.example.co/\napi_key: anon-key\ntables:\n  gallery: photos"
        )
        .unwrap();

        let config = StoreConfig::load(file.path(), false).unwrap();
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.tables.gallery, "photos");
        assert_eq!(config.tables.partnerships, "partnership_requests");
        assert_eq!(
            config.collection_url(RecordKind::Gallery),
            "https://abc.example.co/rest/v1/photos"
        );
    }

    #[test]
    fn missing_file_is_an_error_unless_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.yml");
        assert!(matches!(
            StoreConfig::load(&path, false),
            Err(ConfigError::NotFound(_))
        ));
    }

    #[test]
    fn environment_overrides_file_values() {
        let mut config = StoreConfig {
            base_url: "https://file.example.co".to_string(),
            api_key: "file-key".to_string(),
            ..StoreConfig::default()
        };
        config.apply_overrides(|name| match name {
            ENV_API_KEY => Some("env-key".to_string()),
            ENV_BASE_URL => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.base_url, "https://file.example.co");
    }

    #[test]
    fn validation_requires_url_and_key() {
        let mut config = StoreConfig::default();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("base_url"))));
        config.base_url = "abc.example.co".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBaseUrl(_))));
        config.base_url = "https://abc.example.co".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Missing("api_key"))));
    }

    #[test]
    fn malformed_yaml_reports_path() {
        let err = StoreConfig::from_yaml("timeout_secs: [", Path::new("bad.yml")).unwrap_err();
        assert!(err.to_string().contains("bad.yml"));
    }
}
