use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result, anyhow};

use crate::client::DEFAULT_ENDPOINT;

/// Environment variable that overrides the configured endpoint.
pub const ENDPOINT_ENV: &str = "SHOPCHAT_ENDPOINT";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub endpoint: Option<String>,
    pub user_id: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the user's config directory, or defaults if there is no file yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config: Config = serde_json::from_str(&config_content)
            .with_context(|| format!("parsing {}", path.display()))?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Endpoint to use: explicit override, then `SHOPCHAT_ENDPOINT`, then the
    /// config file, then the built-in default.
    pub fn resolve_endpoint(&self, cli_override: Option<&str>) -> String {
        let env_value = std::env::var(ENDPOINT_ENV).ok();
        self.resolve_endpoint_with(cli_override, env_value.as_deref())
    }

    fn resolve_endpoint_with(&self, cli_override: Option<&str>, env_value: Option<&str>) -> String {
        cli_override
            .or(env_value.filter(|v| !v.trim().is_empty()))
            .or(self.endpoint.as_deref())
            .unwrap_or(DEFAULT_ENDPOINT)
            .to_string()
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("shopchat").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            endpoint: Some("http://shop.local/api/chatbot/query".to_string()),
            user_id: Some("7".to_string()),
        };

        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_leaves_other_fields_unset() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "user_id": "abc" }"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.endpoint, None);
        assert_eq!(config.user_id.as_deref(), Some("abc"));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ endpoint").unwrap();

        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn endpoint_precedence() {
        let config = Config {
            endpoint: Some("http://file".to_string()),
            user_id: None,
        };

        assert_eq!(config.resolve_endpoint_with(Some("http://cli"), Some("http://env")), "http://cli");
        assert_eq!(config.resolve_endpoint_with(None, Some("http://env")), "http://env");
        assert_eq!(config.resolve_endpoint_with(None, Some("  ")), "http://file");
        assert_eq!(config.resolve_endpoint_with(None, None), "http://file");
        assert_eq!(Config::new().resolve_endpoint_with(None, None), DEFAULT_ENDPOINT);
    }
}
