use crate::client::{DEFAULT_API_BASE_URL, DEFAULT_MODEL};
use crate::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Application name used for the config directory
pub const APP_NAME: &str = "mathtutor";

/// Default listen address of the HTTP server
pub const DEFAULT_HTTP_ADDR: &str = "127.0.0.1:8080";

/// Configuration shared by the server and the CLI
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TutorConfig {
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub api_base_url: Option<String>,
    pub http_addr: Option<String>,
    pub log_level: Option<String>,
}

/// Everything the model gateway needs. Built from a [`TutorConfig`] once the
/// API key is known.
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub api_key: String,
    pub model_name: String,
    pub base_url: String,
}

impl GatewayConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model_name: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }
}

impl TutorConfig {
    /// Loads configuration from a file if it exists, otherwise returns the default config
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads the config file from the default location
    pub fn load_from_default() -> ConfigResult<Self> {
        Self::load_from_file(&get_default_config_file(APP_NAME)?)
    }

    /// Saves configuration to a file
    pub fn save_to_file(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string(self)?;

        // Ensure the directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, content)?;
        Ok(())
    }

    /// Reads overrides from the process environment, after loading `.env`.
    ///
    /// `GEMINI_API_KEY` wins over `API_KEY`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let var = |name: &str| env::var(name).ok().filter(|value| !value.is_empty());
        Self {
            api_key: var("GEMINI_API_KEY").or_else(|| var("API_KEY")),
            model_name: var("MATHTUTOR_MODEL"),
            api_base_url: var("MATHTUTOR_API_BASE_URL"),
            http_addr: var("MATHTUTOR_HTTP_ADDR"),
            log_level: var("MATHTUTOR_LOG"),
        }
    }

    /// Merges this config with another config, preferring values from the other config if present
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            api_key: other.api_key.clone().or_else(|| self.api_key.clone()),
            model_name: other.model_name.clone().or_else(|| self.model_name.clone()),
            api_base_url: other
                .api_base_url
                .clone()
                .or_else(|| self.api_base_url.clone()),
            http_addr: other.http_addr.clone().or_else(|| self.http_addr.clone()),
            log_level: other.log_level.clone().or_else(|| self.log_level.clone()),
        }
    }

    /// Gateway settings, failing when no API key was configured anywhere
    pub fn gateway_config(&self) -> ConfigResult<GatewayConfig> {
        let api_key = self.api_key.clone().ok_or(ConfigError::MissingApiKey)?;

        Ok(GatewayConfig {
            api_key,
            model_name: self
                .model_name
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: self
                .api_base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
        })
    }

    pub fn http_addr(&self) -> &str {
        self.http_addr.as_deref().unwrap_or(DEFAULT_HTTP_ADDR)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }
}

/// Helper function to get default config directory
pub fn get_default_config_dir(app_name: &str) -> ConfigResult<PathBuf> {
    let home_dir = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home_dir.join(".config").join(app_name))
}

/// Helper function to get default config file path
pub fn get_default_config_file(app_name: &str) -> ConfigResult<PathBuf> {
    let config_dir = get_default_config_dir(app_name)?;
    Ok(config_dir.join("config.toml"))
}
