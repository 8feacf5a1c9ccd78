//! Configuration loading and management for notewise.
//!
//! Loads settings from `notewise.toml` with environment variable overrides for sensitive data.
//! When no config file exists the built-in defaults are used, so the service can run
//! from the environment alone.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const CONFIG_FILE: &str = "notewise.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("missing required API key for provider: {0}")]
    MissingApiKey(String),
    #[error("invalid config value for {0}: {1}")]
    InvalidValue(&'static str, String),
}

/// Hosted model provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Groq's OpenAI-compatible chat completions API
    #[default]
    Groq,
    /// Google Gemini
    Gemini,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Groq => "groq",
            Provider::Gemini => "gemini",
        }
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// LLM provider: "groq" or "gemini"
    #[serde(default)]
    pub provider: Provider,
    /// Model identifier (e.g., "llama-3.3-70b-versatile")
    #[serde(default = "default_model")]
    pub model: String,
    /// Base URL of the OpenAI-compatible API (groq only)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Upper bound on a single model call, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Sampling temperature; provider default when unset
    #[serde(default)]
    pub temperature: Option<f32>,
    /// Response token limit; provider default when unset
    #[serde(default)]
    pub max_tokens: Option<u32>,
    /// Ask the provider to constrain output to a JSON object (groq only)
    #[serde(default = "default_json_mode")]
    pub json_mode: bool,
}

/// API keys configuration (loaded from environment)
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    #[serde(default)]
    pub groq_key: Option<String>,
    #[serde(default)]
    pub gemini_key: Option<String>,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_endpoint() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_json_mode() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
            temperature: None,
            max_tokens: None,
            json_mode: default_json_mode(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl AgentConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default location (notewise.toml in cwd or home)
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::find_config_file() {
            Some(path) => Self::read_file(&path)?,
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env();
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.agent.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "agent.timeout_secs",
                "must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Override API keys from environment variables
    fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("GROQ_API_KEY") {
            self.api.groq_key = Some(key);
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.api.gemini_key = Some(key);
        }
    }

    /// Find the config file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        // Check current directory first
        let local_config = PathBuf::from(CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        // Check home directory
        let home_config = dirs::home_dir()?
            .join(".config")
            .join("notewise")
            .join(CONFIG_FILE);
        home_config.exists().then_some(home_config)
    }

    /// Get the API key for the configured provider
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        let key = match self.agent.provider {
            Provider::Groq => self.api.groq_key.as_deref(),
            Provider::Gemini => self.api.gemini_key.as_deref(),
        };
        key.filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingApiKey(self.agent.provider.as_str().to_string()))
    }
}
