use secrecy::{ExposeSecret, SecretBox};
use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::completion::CompletionConfig;
use crate::session::SessionConfig;

pub const RENDERER_URL_VAR: &str = "ASTRO_RENDERER_URL";
pub const RENDERER_TIMEOUT_VAR: &str = "ASTRO_RENDERER_TIMEOUT_SECS";
pub const CONNECT_ATTEMPTS_VAR: &str = "ASTRO_CONNECT_ATTEMPTS";
pub const CONNECT_RETRY_DELAY_VAR: &str = "ASTRO_CONNECT_RETRY_DELAY_SECS";
pub const LM_STUDIO_URL_VAR: &str = "ASTRO_LM_STUDIO_URL";
pub const LM_STUDIO_MODEL_VAR: &str = "ASTRO_LM_STUDIO_MODEL";
pub const LM_STUDIO_API_KEY_VAR: &str = "ASTRO_LM_STUDIO_API_KEY";
pub const LLM_TIMEOUT_VAR: &str = "ASTRO_LLM_TIMEOUT_SECS";
pub const LLM_TEMPERATURE_VAR: &str = "ASTRO_LLM_TEMPERATURE";
pub const LLM_MAX_TOKENS_VAR: &str = "ASTRO_LLM_MAX_TOKENS";
pub const STABILITY_THRESHOLD_VAR: &str = "ASTRO_STABILITY_THRESHOLD";
pub const MAX_NAVIGATION_WAIT_VAR: &str = "ASTRO_MAX_NAVIGATION_WAIT_SECS";
pub const LISTEN_TIMEOUT_VAR: &str = "ASTRO_LISTEN_TIMEOUT_SECS";
pub const TTS_COMMAND_VAR: &str = "ASTRO_TTS_COMMAND";

/// Every variable the loader reads
pub const ALL_VARS: &[&str] = &[
    RENDERER_URL_VAR,
    RENDERER_TIMEOUT_VAR,
    CONNECT_ATTEMPTS_VAR,
    CONNECT_RETRY_DELAY_VAR,
    LM_STUDIO_URL_VAR,
    LM_STUDIO_MODEL_VAR,
    LM_STUDIO_API_KEY_VAR,
    LLM_TIMEOUT_VAR,
    LLM_TEMPERATURE_VAR,
    LLM_MAX_TOKENS_VAR,
    STABILITY_THRESHOLD_VAR,
    MAX_NAVIGATION_WAIT_VAR,
    LISTEN_TIMEOUT_VAR,
    TTS_COMMAND_VAR,
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {var}: '{value}'")]
    Invalid { var: String, value: String },
    #[error("Failed to load env file {path}: {reason}")]
    EnvFile { path: String, reason: String },
    #[error("Environment error: {0}")]
    EnvError(#[from] env::VarError),
}

/// Connection settings for the renderer's REST bridge
#[derive(Debug, Clone)]
pub struct RendererConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub connect_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080/api".to_string(),
            timeout: Duration::from_secs(10),
            connect_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

/// Settings for the local OpenAI-compatible model server (LM Studio)
#[derive(Debug)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    api_key: Option<SecretBox<String>>,
    pub timeout: Duration,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234/v1".to_string(),
            model: "google/gemma-3-4b-it".to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            temperature: 0.1,
            max_tokens: 100,
        }
    }
}

impl LlmConfig {
    /// Get the API key (use only when making API calls)
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_ref().map(|key| key.expose_secret().as_str())
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(SecretBox::new(Box::new(key.into())));
        self
    }
}

/// Complete application configuration
#[derive(Debug, Default)]
pub struct AppConfig {
    pub renderer: RendererConfig,
    pub llm: LlmConfig,
    pub completion: CompletionConfig,
    pub session: SessionConfig,
    /// External speech program (`say`, `espeak`); console output when unset
    pub tts_command: Option<String>,
}

impl AppConfig {
    /// Load configuration from environment variables, reading `.env` if present
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (for development)
        dotenvy::dotenv().ok(); // Don't error if .env doesn't exist
        Self::from_env()
    }

    /// Load configuration after reading an explicit env file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        dotenvy::from_path(path).map_err(|e| ConfigError::EnvFile {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_env()
    }

    /// Build configuration from the current process environment only
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = env_string(RENDERER_URL_VAR)? {
            config.renderer.base_url = url;
        }
        config.renderer.timeout = env_secs(RENDERER_TIMEOUT_VAR, config.renderer.timeout)?;
        config.renderer.connect_attempts =
            env_parse(CONNECT_ATTEMPTS_VAR, config.renderer.connect_attempts)?.max(1);
        config.renderer.retry_delay =
            env_secs(CONNECT_RETRY_DELAY_VAR, config.renderer.retry_delay)?;

        if let Some(url) = env_string(LM_STUDIO_URL_VAR)? {
            config.llm.base_url = url;
        }
        if let Some(model) = env_string(LM_STUDIO_MODEL_VAR)? {
            config.llm.model = model;
        }
        if let Some(key) = env_string(LM_STUDIO_API_KEY_VAR)? {
            config.llm = config.llm.with_api_key(key);
        }
        config.llm.timeout = env_secs(LLM_TIMEOUT_VAR, config.llm.timeout)?;
        config.llm.temperature = env_parse(LLM_TEMPERATURE_VAR, config.llm.temperature)?;
        config.llm.max_tokens = env_parse(LLM_MAX_TOKENS_VAR, config.llm.max_tokens)?;

        let threshold = env_parse(
            STABILITY_THRESHOLD_VAR,
            config.completion.stability_threshold,
        )?;
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(ConfigError::Invalid {
                var: STABILITY_THRESHOLD_VAR.to_string(),
                value: threshold.to_string(),
            });
        }
        config.completion.stability_threshold = threshold;
        config.completion.max_navigation_wait =
            env_secs(MAX_NAVIGATION_WAIT_VAR, config.completion.max_navigation_wait)?;

        config.session.listen_timeout = env_secs(LISTEN_TIMEOUT_VAR, config.session.listen_timeout)?;
        config.tts_command = env_string(TTS_COMMAND_VAR)?;

        Ok(config)
    }
}

/// Read a variable, treating unset and blank values the same
fn env_string(var: &str) -> Result<Option<String>, ConfigError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(e) => Err(ConfigError::EnvError(e)),
    }
}

fn env_parse<T: FromStr>(var: &str, default: T) -> Result<T, ConfigError> {
    match env_string(var)? {
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
            var: var.to_string(),
            value,
        }),
        None => Ok(default),
    }
}

/// Seconds as a (possibly fractional) non-negative number
fn env_secs(var: &str, default: Duration) -> Result<Duration, ConfigError> {
    let secs: f64 = env_parse(var, default.as_secs_f64())?;
    Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::Invalid {
        var: var.to_string(),
        value: secs.to_string(),
    })
}

/// Load configuration with helpful error messages for development
pub fn load_config(env_file: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let result = match env_file {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };

    match result {
        Ok(config) => {
            log::info!(
                "⚙️ Configuration loaded (renderer: {}, model: {})",
                config.renderer.base_url,
                config.llm.model
            );
            Ok(config)
        }
        Err(ConfigError::Invalid { var, value }) => {
            log::error!("Invalid value '{}' for environment variable {}", value, var);
            log::error!("Fix the value in your environment or .env file, or unset it to use the default");
            Err(ConfigError::Invalid { var, value })
        }
        Err(e) => {
            log::error!("Configuration error: {}", e);
            Err(e)
        }
    }
}
