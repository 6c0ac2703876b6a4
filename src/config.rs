use crate::compositor::DEFAULT_ASSET_TIMEOUT;
use crate::gemini_client::{
    ApiError, GeminiClient, DEFAULT_BASE_URL, DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_MODEL,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const API_KEY_ENV_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api_key: String,
    pub model: String,
    pub api_base_url: String,
    pub export_folder: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub asset_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_BASE_URL.to_string(),
            export_folder: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            asset_timeout_secs: DEFAULT_ASSET_TIMEOUT.as_secs(),
        }
    }
}

impl AppConfig {
    /// `<config dir>/CoverStudio/config.json`, falling back to the working
    /// directory when the platform has no config dir.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("CoverStudio")
            .join("config.json")
    }

    /// Loads the config, or returns `None` when it is missing or unreadable.
    pub fn load(path: &Path) -> Option<AppConfig> {
        if !path.exists() {
            log::info!("Config file does not exist at: {:?}", path);
            return None;
        }
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
                Ok(config) => {
                    log::info!("Loaded config from {:?}", path);
                    Some(config)
                }
                Err(e) => {
                    log::warn!("Failed to parse config {:?}: {}", path, e);
                    None
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file {:?}: {}", path, e);
                None
            }
        }
    }

    pub fn load_or_default(path: &Path) -> AppConfig {
        Self::load(path).unwrap_or_default()
    }

    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Saved config to {:?}", path);
        Ok(())
    }

    /// Configured key, or the first non-empty key from the environment.
    pub fn resolved_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        if !self.api_key.trim().is_empty() {
            return Some(self.api_key.trim().to_string());
        }
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .map(|value| value.trim().to_string())
            .find(|value| !value.is_empty())
    }

    pub fn asset_timeout(&self) -> Duration {
        Duration::from_secs(self.asset_timeout_secs.max(1))
    }

    pub fn build_client(&self) -> Result<GeminiClient, ApiError> {
        let api_key = self.resolved_api_key().ok_or(ApiError::MissingApiKey)?;
        GeminiClient::new(
            self.api_base_url.clone(),
            api_key,
            self.model.clone(),
            Duration::from_secs(self.request_timeout_secs),
            Duration::from_secs(self.connect_timeout_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_config_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("cover-studio-{}", uuid::Uuid::new_v4()))
            .join("config.json")
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{ "api_key": "abc" }"#).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.api_base_url, DEFAULT_BASE_URL);
        assert_eq!(config.asset_timeout_secs, 15);
        assert!(config.export_folder.is_none());
    }

    #[test]
    fn test_save_then_load() {
        let path = temp_config_path();
        let config = AppConfig {
            api_key: "key-123".to_string(),
            export_folder: Some("/tmp/covers".to_string()),
            ..Default::default()
        };
        config.save(&path).unwrap();

        assert_eq!(AppConfig::load(&path), Some(config));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_load_missing_or_corrupt() {
        let path = temp_config_path();
        assert!(AppConfig::load(&path).is_none());

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load(&path).is_none());
        assert_eq!(AppConfig::load_or_default(&path), AppConfig::default());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_api_key_resolution_order() {
        let env = |name: &str| match name {
            "GEMINI_API_KEY" => Some("  ".to_string()),
            "API_KEY" => Some("from-env".to_string()),
            _ => None,
        };

        let mut config = AppConfig::default();
        assert_eq!(config.resolve_api_key_with(env).as_deref(), Some("from-env"));
        assert_eq!(config.resolve_api_key_with(|_| None), None);

        config.api_key = "from-config".to_string();
        assert_eq!(config.resolve_api_key_with(env).as_deref(), Some("from-config"));
    }

    #[test]
    fn test_asset_timeout_never_zero() {
        let config = AppConfig {
            asset_timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(config.asset_timeout(), Duration::from_secs(1));
    }
}
