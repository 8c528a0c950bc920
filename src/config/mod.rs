use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::ConverterError;

/// Default transcript backend for local development
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Default file name of the exported article
pub const DEFAULT_ARTICLE_FILE: &str = "youtube-article.md";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Transcript backend settings
    pub backend: BackendConfig,

    /// Generative rewriting service settings
    pub writer: WriterConfig,

    /// Export settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base address of the transcript backend
    pub base_url: String,

    /// Upper bound for one transcript request
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Model identifier sent to the messages endpoint
    pub model: String,

    /// Token budget of one article
    pub max_tokens: u32,

    /// Upper bound for one rewriting request
    pub timeout_secs: u64,

    /// Environment variable holding the API key
    pub api_key_env: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// File name used when exporting without an explicit path
    pub file_name: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            timeout_secs: 60,
        }
    }
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            model: "claude-sonnet-4-20250514".to_string(),
            max_tokens: 4000,
            timeout_secs: 180,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_ARTICLE_FILE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::debug!("No config file at {}, using defaults", config_path.display());
            Ok(Self::default())
        }
    }

    /// Load and validate a specific config file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs_err::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save configuration to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs_err::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self).context("Failed to serialize config")?;

        fs_err::write(path, content).context("Failed to write config file")?;

        Ok(())
    }

    /// Get configuration file path
    pub fn config_path() -> Result<PathBuf> {
        // Current directory wins so a project can carry its own settings
        let local_config = PathBuf::from("config.yaml");
        if local_config.exists() {
            return Ok(local_config);
        }

        let config_dir = dirs::config_dir().context("Could not determine config directory")?;

        Ok(config_dir.join("vid2article").join("config.yaml"))
    }

    /// Override the transcript backend address
    pub fn with_backend_url(mut self, base_url: Option<String>) -> Result<Self> {
        if let Some(url) = base_url {
            self.backend.base_url = url;
            self.validate()?;
        }
        Ok(self)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConverterError> {
        let parsed = Url::parse(&self.backend.base_url).map_err(|_| {
            ConverterError::InvalidConfig(format!(
                "backend.base_url is not a valid URL: {}",
                self.backend.base_url
            ))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConverterError::InvalidConfig(
                "backend.base_url must use HTTP or HTTPS protocol".to_string(),
            ));
        }

        if self.backend.timeout_secs == 0 || self.writer.timeout_secs == 0 {
            return Err(ConverterError::InvalidConfig(
                "timeouts must be greater than zero".to_string(),
            ));
        }

        if self.writer.max_tokens == 0 {
            return Err(ConverterError::InvalidConfig(
                "writer.max_tokens must be greater than zero".to_string(),
            ));
        }

        if self.output.file_name.trim().is_empty() {
            return Err(ConverterError::InvalidConfig(
                "output.file_name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }

    pub fn transform_timeout(&self) -> Duration {
        Duration::from_secs(self.writer.timeout_secs)
    }

    /// Display current configuration
    pub fn display(&self) {
        println!("Current Configuration:");
        println!("  Transcript backend: {}", self.backend.base_url);
        println!("  Backend timeout: {}s", self.backend.timeout_secs);
        println!("  Model: {}", self.writer.model);
        println!("  Max tokens: {}", self.writer.max_tokens);
        println!("  Writer timeout: {}s", self.writer.timeout_secs);
        println!("  API key variable: {}", self.writer.api_key_env);
        println!("  Export file: {}", self.output.file_name);
    }
}
