//! Configuration Loader
//!
//! Builds a [`ClientConfig`] from a `.env` file, JSON config files and
//! environment variables. Later sources override earlier ones; environment
//! variables always win.

use crate::config::client::ClientConfig;
use crate::error::{OpenRouterError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";
pub const BASE_URL_ENV: &str = "OPENROUTER_BASE_URL";
pub const HTTP_REFERER_ENV: &str = "OPENROUTER_HTTP_REFERER";
pub const X_TITLE_ENV: &str = "OPENROUTER_X_TITLE";
pub const CONFIG_PATH_ENV: &str = "OPENROUTER_CONFIG_PATH";

/// On-disk configuration. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub http_referer: Option<String>,
    pub x_title: Option<String>,
    pub timeout_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
}

impl FileConfig {
    /// Merge another config into this one (fields set in `other` win)
    fn merge(&mut self, other: FileConfig) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            api_key,
            base_url,
            http_referer,
            x_title,
            timeout_secs,
            connect_timeout_secs,
            max_retries
        );
    }
}

/// Configuration loader with support for multiple sources
#[derive(Debug, Default)]
pub struct ConfigLoader {
    config: FileConfig,
}

impl ConfigLoader {
    /// Load `.env`, the default config file locations, then the environment
    pub fn new() -> Result<Self> {
        Self::load_dotenv();

        let mut loader = Self::default();
        loader.load_from_default_paths()?;
        loader.load_env();
        Ok(loader)
    }

    /// Load a specific config file, then the environment
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_dotenv();

        let mut loader = Self::default();
        loader.load_from_file(path)?;
        loader.load_env();
        Ok(loader)
    }

    fn load_dotenv() {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => {}
            Err(e) => tracing::warn!(error = %e, "failed to load .env"),
        }
    }

    /// Load configuration from default paths
    fn load_from_default_paths(&mut self) -> Result<()> {
        for path in Self::get_config_paths() {
            if path.exists() {
                self.load_from_file(&path)?;
            }
        }
        Ok(())
    }

    /// Config paths in increasing priority
    fn get_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("openrouter").join("config.json"));
        }

        paths.push(PathBuf::from("openrouter.json"));

        if let Ok(custom_path) = std::env::var(CONFIG_PATH_ENV) {
            paths.push(PathBuf::from(custom_path));
        }

        paths
    }

    /// Load configuration from a specific file
    fn load_from_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            OpenRouterError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: FileConfig = serde_json::from_str(&content).map_err(|e| {
            OpenRouterError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        tracing::debug!(path = %path.display(), "loaded config file");
        self.config.merge(config);
        Ok(())
    }

    fn load_env(&mut self) {
        self.merge_env_with(|name| std::env::var(name).ok());
    }

    /// Apply environment overrides read through `lookup`. Empty values are
    /// ignored.
    fn merge_env_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        self.config.merge(FileConfig {
            api_key: var(API_KEY_ENV),
            base_url: var(BASE_URL_ENV),
            http_referer: var(HTTP_REFERER_ENV),
            x_title: var(X_TITLE_ENV),
            ..Default::default()
        });
    }

    /// Get the merged configuration
    pub fn config(&self) -> &FileConfig {
        &self.config
    }

    /// Build the client configuration. Fails when no API key was found.
    pub fn into_config(self) -> Result<ClientConfig> {
        let FileConfig {
            api_key,
            base_url,
            http_referer,
            x_title,
            timeout_secs,
            connect_timeout_secs,
            max_retries,
        } = self.config;

        let api_key = api_key.ok_or_else(|| {
            OpenRouterError::Config(format!("No API key found. Set {}", API_KEY_ENV))
        })?;

        let mut config = ClientConfig::new(api_key);
        if let Some(url) = base_url {
            config = config.with_base_url(url);
        }
        if let Some(referer) = http_referer {
            config = config.with_http_referer(referer);
        }
        if let Some(title) = x_title {
            config = config.with_x_title(title);
        }
        if let Some(secs) = timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = connect_timeout_secs {
            config = config.with_connect_timeout(Duration::from_secs(secs));
        }
        if let Some(retries) = max_retries {
            config = config.with_max_retries(retries);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_BASE_URL;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn config_file(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", json).unwrap();
        file
    }

    #[test]
    fn test_load_from_custom_file() {
        let file = config_file(
            r#"{
                "api_key": "sk-or-file",
                "base_url": "https://proxy.example.com/api/v1",
                "x_title": "From File",
                "timeout_secs": 30,
                "max_retries": 2
            }"#,
        );

        let mut loader = ConfigLoader::default();
        loader.load_from_file(file.path()).unwrap();
        let config = loader.into_config().unwrap();

        assert_eq!(config.auth_token(), "sk-or-file");
        assert_eq!(config.base_url, "https://proxy.example.com/api/v1");
        assert_eq!(config.x_title, "From File");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = config_file(r#"{"api_key": "sk-or-file", "http_referer": "https://file"}"#);
        let env: HashMap<&str, &str> = [
            (API_KEY_ENV, "sk-or-env"),
            (HTTP_REFERER_ENV, ""),
            (X_TITLE_ENV, "Env Title"),
        ]
        .into_iter()
        .collect();

        let mut loader = ConfigLoader::default();
        loader.load_from_file(file.path()).unwrap();
        loader.merge_env_with(|name| env.get(name).map(|v| v.to_string()));
        let config = loader.into_config().unwrap();

        assert_eq!(config.auth_token(), "sk-or-env");
        // Empty variables do not clear file values
        assert_eq!(config.http_referer, "https://file");
        assert_eq!(config.x_title, "Env Title");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_later_files_override_earlier() {
        let first = config_file(r#"{"api_key": "a", "x_title": "first"}"#);
        let second = config_file(r#"{"x_title": "second"}"#);

        let mut loader = ConfigLoader::default();
        loader.load_from_file(first.path()).unwrap();
        loader.load_from_file(second.path()).unwrap();

        assert_eq!(loader.config().api_key.as_deref(), Some("a"));
        assert_eq!(loader.config().x_title.as_deref(), Some("second"));
    }

    #[test]
    fn test_missing_api_key() {
        let err = ConfigLoader::default().into_config().unwrap_err();
        assert!(matches!(err, OpenRouterError::Config(msg) if msg.contains(API_KEY_ENV)));
    }

    #[test]
    fn test_invalid_file() {
        let file = config_file(r#"{"api_key": 42}"#);
        let err = ConfigLoader::default()
            .load_from_file(file.path())
            .unwrap_err();
        assert!(matches!(err, OpenRouterError::Config(_)));

        let err = ConfigLoader::from_path("/nonexistent/openrouter.json").unwrap_err();
        assert!(matches!(err, OpenRouterError::Config(msg) if msg.contains("Failed to read")));
    }
}
