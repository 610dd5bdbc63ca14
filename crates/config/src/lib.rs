//! Configuration management for weatherdesk
//!
//! Loads agent and provider settings from `~/.weatherdesk/config.json`,
//! a local `.env` file and the process environment, in that order.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir};

/// Environment variable holding the Gemini key.
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";
/// Environment variable holding an OpenRouter key.
pub const OPENROUTER_API_KEY: &str = "OPENROUTER_API_KEY";
/// Environment variable holding an OpenAI key.
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Environment variable overriding the agent model.
pub const MODEL_ENV: &str = "WEATHERDESK_MODEL";

/// Errors in configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(
        "no API key configured. Set {GOOGLE_API_KEY} in the environment or a .env file, \
         or add a provider key to the config file"
    )]
    MissingApiKey,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Credentials for one chat-completions endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base: Option<String>,
}

impl ProviderConfig {
    fn is_set(&self) -> bool {
        !self.api_key.is_empty()
    }
}

/// All supported providers
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: ProviderConfig,
    #[serde(default)]
    pub openrouter: ProviderConfig,
    #[serde(default)]
    pub openai: ProviderConfig,
}

/// Agent runtime parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_iterations")]
    pub max_tool_iterations: u32,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            max_tool_iterations: default_max_iterations(),
        }
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_iterations() -> u32 {
    10
}

/// Root configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}

impl Config {
    /// Load from specific location, falling back to defaults when absent
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("no config at {:?}, using defaults", path);
            return Ok(Config::default());
        }

        debug!("reading config from {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Load `.env`, then the config file, then apply environment overrides.
    ///
    /// This is the single startup step the binary performs before any tool
    /// or agent is used.
    pub async fn load_with_env(path: &Path) -> Result<Self> {
        load_dotenv();
        let mut config = Self::load_from(path).await?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Override settings from an environment lookup.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(GOOGLE_API_KEY) {
            debug!("using {} from environment", GOOGLE_API_KEY);
            self.providers.gemini.api_key = key;
        }
        if let Some(key) = get(OPENROUTER_API_KEY) {
            debug!("using {} from environment", OPENROUTER_API_KEY);
            self.providers.openrouter.api_key = key;
        }
        if let Some(key) = get(OPENAI_API_KEY) {
            debug!("using {} from environment", OPENAI_API_KEY);
            self.providers.openai.api_key = key;
        }
        if let Some(model) = get(MODEL_ENV) {
            self.agent.model = model;
        }
    }

    /// Save to specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("writing config to {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    fn active_provider(&self) -> Option<&ProviderConfig> {
        [
            &self.providers.gemini,
            &self.providers.openrouter,
            &self.providers.openai,
        ]
        .into_iter()
        .find(|p| p.is_set())
    }

    /// API key of the first configured provider (gemini > openrouter > openai)
    pub fn api_key(&self) -> Option<String> {
        self.active_provider().map(|p| p.api_key.clone())
    }

    /// Endpoint override of the provider whose key is used
    pub fn api_base(&self) -> Option<String> {
        self.active_provider()
            .and_then(|p| p.api_base.clone())
            .filter(|b| !b.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    /// API key, or the fatal startup error when none is configured
    pub fn require_api_key(&self) -> Result<String> {
        self.api_key().ok_or(ConfigError::MissingApiKey)
    }

    pub fn model(&self) -> String {
        self.agent.model.clone()
    }
}

/// Load a `.env` file from the current directory or its parents.
///
/// Variables already set in the process environment win.
pub fn load_dotenv() -> Option<PathBuf> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!("loaded environment from {:?}", path);
            Some(path)
        }
        Err(e) if e.not_found() => None,
        Err(e) => {
            warn!("failed to read .env file: {}", e);
            None
        }
    }
}

/// Write a default config at `path` unless one exists, then load it
pub async fn init_at(path: &Path) -> Result<Config> {
    if path.exists() {
        warn!("config already exists at {:?}", path);
    } else {
        Config::default().save_to(path).await?;
        info!("config written to {:?}", path);
    }

    Config::load_from(path).await
}
