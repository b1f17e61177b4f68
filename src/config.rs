// Configuration management

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::AppConfig;

pub const APP_NAME: &str = "chronicle-explorer";
pub const BASE_URL_ENV: &str = "CHRONICLE_API_BASE_URL";

pub fn get_config_dir() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join(APP_NAME);

    fs::create_dir_all(&config_dir).context("Failed to create config directory")?;

    Ok(config_dir)
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_config_dir()?.join("config.toml"))
}

/// Load the user's config file, creating it with defaults on first run, then
/// apply environment overrides.
pub fn load_config() -> Result<AppConfig> {
    let mut config = load_config_from(&get_config_path()?)?;
    apply_env_overrides(&mut config, std::env::var(BASE_URL_ENV).ok());
    Ok(config)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        let default_config = AppConfig::default();
        save_config_to(path, &default_config)?;
        return Ok(default_config);
    }

    let contents = fs::read_to_string(path).context("Failed to read config file")?;

    let config: AppConfig = toml::from_str(&contents).context("Failed to parse config file")?;

    Ok(config)
}

pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<()> {
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;

    fs::write(path, contents).context("Failed to write config file")?;

    Ok(())
}

fn apply_env_overrides(config: &mut AppConfig, base_url: Option<String>) {
    if let Some(base_url) = base_url.filter(|url| !url.trim().is_empty()) {
        config.api_base_url = base_url;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_creates_default() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config = load_config_from(&config_path);
        assert!(config.is_ok(), "Config loading failed: {:?}", config.err());
        assert!(config_path.exists());

        let config = config.unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000/api");
        assert_eq!(config.request_timeout, 10);
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config = AppConfig {
            api_base_url: "http://custom:8080/api".to_string(),
            default_model: Some("gemini".to_string()),
            ..Default::default()
        };
        save_config_to(&config_path, &config).unwrap();

        let loaded = load_config_from(&config_path).unwrap();
        assert_eq!(loaded.api_base_url, "http://custom:8080/api");
        assert_eq!(loaded.default_model.as_deref(), Some("gemini"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "api_base_url = \"http://backend/api\"\n").unwrap();

        let loaded = load_config_from(&config_path).unwrap();
        assert_eq!(loaded.api_base_url, "http://backend/api");
        assert_eq!(loaded.request_timeout, 10);
        assert_eq!(loaded.log_level, "info");
        assert!(loaded.default_model.is_none());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "request_timeout = \"soon\"").unwrap();

        assert!(load_config_from(&config_path).is_err());
    }

    #[test]
    fn test_env_override() {
        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, Some("http://remote:9000/api".to_string()));
        assert_eq!(config.api_base_url, "http://remote:9000/api");

        let mut config = AppConfig::default();
        apply_env_overrides(&mut config, Some("  ".to_string()));
        assert_eq!(config.api_base_url, "http://localhost:8000/api");

        apply_env_overrides(&mut config, None);
        assert_eq!(config.api_base_url, "http://localhost:8000/api");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let serialized = toml::to_string(&config);
        assert!(serialized.is_ok());

        let deserialized: Result<AppConfig, _> = toml::from_str(&serialized.unwrap());
        assert!(deserialized.is_ok());
    }
}
