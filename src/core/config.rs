use crate::core::LLMError;
use ::config::{Environment, File, FileFormat};
use clap::ValueEnum;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

include!(concat!(env!("OUT_DIR"), "/default_config.rs"));

const ENV_PREFIX: &str = "LLM_SHIM";

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    pub base_url: String,
    pub default_model: String,
    pub max_tokens: u32,
    /// Name of the environment variable holding the API key, if the endpoint needs one
    #[serde(default)]
    pub api_key_env: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub provider: Provider,
    pub system_prompt: Option<String>,
    pub openrouter: ProviderConfig,
    pub proxy: ProviderConfig,
    pub enable_tools: bool,
    pub max_steps: u32,
    pub timeout_secs: u64,
    pub temperature: Option<f32>,
}

#[derive(Clone, Copy, Debug, Deserialize, ValueEnum, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Hosted OpenAI-compatible router
    #[value(name = "openrouter")]
    OpenRouter,
    /// Local OpenAI-compatible gateway
    #[value(name = "proxy")]
    Proxy,
}

/// `LLM_SHIM_MAX_STEPS=3`, `LLM_SHIM_PROXY__DEFAULT_MODEL=local-chat`
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("Invalid default config")
    }
}

impl Config {
    /// Loads the embedded defaults, then `./config.toml`, then `LLM_SHIM_*` variables.
    pub fn load() -> Result<Self, LLMError> {
        Self::load_from(Path::new("config.toml"))
    }

    pub fn load_from(path: &Path) -> Result<Self, LLMError> {
        Self::load_layers(path, environment())
    }

    fn load_layers(path: &Path, env: Environment) -> Result<Self, LLMError> {
        let settings = ::config::Config::builder()
            .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(env)
            .build()?;

        settings
            .try_deserialize()
            .map_err(|e| LLMError::ConfigError(format!("Failed to parse config: {e}")))
    }

    pub fn update_provider(&mut self, new_provider: Provider) {
        self.provider = new_provider;
    }

    pub const fn provider_config(&self) -> &ProviderConfig {
        match self.provider {
            Provider::OpenRouter => &self.openrouter,
            Provider::Proxy => &self.proxy,
        }
    }

    pub fn get_model(&self) -> &str {
        &self.provider_config().default_model
    }

    pub const fn get_max_tokens(&self) -> u32 {
        self.provider_config().max_tokens
    }

    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Resolves the API key for the active provider from `.env` or the process environment.
    pub fn api_key(&self) -> Result<Option<String>, LLMError> {
        let Some(var) = self.provider_config().api_key_env.as_deref() else {
            return Ok(None);
        };
        dotenv::var(var)
            .or_else(|_| std::env::var(var))
            .map(Some)
            .map_err(|_| LLMError::ConfigError(format!("{var} not set in .env or environment")))
    }
}
