//! Client configuration.
//!
//! Loaded from a TOML file and overridable through the environment:
//!
//! ```toml
//! base_url = "https://ecoe.example.org"
//! token = "..."
//! timeout_secs = 30
//! per_page = 100
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding [`ClientConfig::base_url`].
pub const ENV_BASE_URL: &str = "ECOE_API_URL";

/// Environment variable overriding [`ClientConfig::token`].
pub const ENV_TOKEN: &str = "ECOE_API_TOKEN";

/// Connection settings for the resource API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Server root; resource URIs (`/api/...`) are appended to it.
    pub base_url: String,

    /// Bearer credential attached to every request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,

    /// Page size requested from listing endpoints.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            token: None,
            timeout_secs: 30,
            per_page: None,
        }
    }
}

/// Configuration could not be read.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ClientConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `ECOE_API_URL` / `ECOE_API_TOKEN` when set.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var(ENV_BASE_URL).ok(),
            std::env::var(ENV_TOKEN).ok(),
        )
    }

    /// Apply explicit overrides; `None` keeps the current value.
    #[must_use]
    pub fn with_overrides(mut self, base_url: Option<String>, token: Option<String>) -> Self {
        if let Some(base_url) = base_url.filter(|url| !url.is_empty()) {
            self.base_url = base_url;
        }
        if let Some(token) = token.filter(|token| !token.is_empty()) {
            self.token = Some(token);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.token.is_none());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ClientConfig::from_toml_str(r#"base_url = "https://ecoe.test""#).unwrap();
        assert_eq!(config.base_url, "https://ecoe.test");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "token = \"secret\"\nper_page = 50").unwrap();
        file.flush().unwrap();

        let config = ClientConfig::load(file.path()).unwrap();
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.per_page, Some(50));
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = \"soon\"").unwrap();
        file.flush().unwrap();

        assert!(matches!(
            ClientConfig::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_overrides_ignore_empty_values() {
        let config = ClientConfig::default()
            .with_overrides(Some(String::new()), Some("abc".to_string()));
        assert_eq!(config.base_url, "http://localhost:5000");
        assert_eq!(config.token.as_deref(), Some("abc"));
    }
}
