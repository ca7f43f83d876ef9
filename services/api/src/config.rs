//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development. Provider keys are optional here: a
//! missing key only fails the actions that need it.

use course_assistant_core::ingestion::UploadLimits;
use course_assistant_core::{ApiKeys, AssistantConfig, GenerationSettings};
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub chat_model: String,
    pub structured_model: String,
    pub anthropic_model: String,
    pub embedding_model: String,
    pub tts_model: String,
    pub max_upload_bytes: usize,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Load API Keys (as optional) ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty());
        let anthropic_api_key = std::env::var("ANTHROPIC_API_KEY").ok().filter(|k| !k.is_empty());

        // --- Load Model Settings ---
        let chat_model = var_or("CHAT_MODEL", "gpt-4o");
        let structured_model = var_or("STRUCTURED_MODEL", "gpt-4-turbo");
        let anthropic_model = var_or("ANTHROPIC_MODEL", "claude-3-7-sonnet-20250219");
        let embedding_model = var_or("EMBEDDING_MODEL", "text-embedding-3-small");
        let tts_model = var_or("TTS_MODEL", "tts-1");
        if !matches!(tts_model.as_str(), "tts-1" | "tts-1-hd") {
            return Err(ConfigError::InvalidValue(
                "TTS_MODEL".to_string(),
                format!("'{}' is not one of tts-1, tts-1-hd", tts_model),
            ));
        }

        let max_upload_str = var_or("MAX_UPLOAD_BYTES", "10485760");
        let max_upload_bytes = max_upload_str
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "MAX_UPLOAD_BYTES".to_string(),
                    format!("'{}' is not a positive byte count", max_upload_str),
                )
            })?;

        Ok(Self {
            bind_address,
            log_level,
            openai_api_key,
            anthropic_api_key,
            chat_model,
            structured_model,
            anthropic_model,
            embedding_model,
            tts_model,
            max_upload_bytes,
        })
    }

    /// Explicit keys handed to the core; unset ones fall back to the
    /// environment at call time.
    pub fn api_keys(&self) -> ApiKeys {
        ApiKeys::new(self.openai_api_key.clone(), self.anthropic_api_key.clone())
    }

    /// Settings of the services shared by every session.
    pub fn assistant_config(&self) -> AssistantConfig {
        AssistantConfig {
            generation: GenerationSettings {
                chat_model: self.chat_model.clone(),
                structured_model: self.structured_model.clone(),
                anthropic_model: self.anthropic_model.clone(),
                ..GenerationSettings::default()
            },
            embedding_model: self.embedding_model.clone(),
            tts_model: self.tts_model.clone(),
            limits: UploadLimits { max_bytes: self.max_upload_bytes },
            ..AssistantConfig::default()
        }
    }
}

// Keys are never printed.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("log_level", &self.log_level)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| "***"))
            .field("anthropic_api_key", &self.anthropic_api_key.as_ref().map(|_| "***"))
            .field("chat_model", &self.chat_model)
            .field("structured_model", &self.structured_model)
            .field("anthropic_model", &self.anthropic_model)
            .field("embedding_model", &self.embedding_model)
            .field("tts_model", &self.tts_model)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 10] = [
        "BIND_ADDRESS",
        "RUST_LOG",
        "OPENAI_API_KEY",
        "ANTHROPIC_API_KEY",
        "CHAT_MODEL",
        "STRUCTURED_MODEL",
        "ANTHROPIC_MODEL",
        "EMBEDDING_MODEL",
        "TTS_MODEL",
        "MAX_UPLOAD_BYTES",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_without_environment() {
        clear_env();
        let config = Config::from_env().unwrap();
        assert_eq!(config.bind_address.to_string(), "0.0.0.0:3000");
        assert_eq!(config.log_level, Level::INFO);
        assert!(config.openai_api_key.is_none());
        assert_eq!(config.chat_model, "gpt-4o");
        assert_eq!(config.structured_model, "gpt-4-turbo");
        assert_eq!(config.anthropic_model, "claude-3-7-sonnet-20250219");
        assert_eq!(config.embedding_model, "text-embedding-3-small");
        assert_eq!(config.tts_model, "tts-1");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    #[serial]
    fn overrides_flow_into_assistant_config() {
        clear_env();
        std::env::set_var("STRUCTURED_MODEL", "gpt-4o");
        std::env::set_var("TTS_MODEL", "tts-1-hd");
        std::env::set_var("MAX_UPLOAD_BYTES", "2048");
        std::env::set_var("OPENAI_API_KEY", "sk-live");

        let config = Config::from_env().unwrap();
        let assistant = config.assistant_config();
        assert_eq!(assistant.generation.structured_model, "gpt-4o");
        assert_eq!(assistant.generation.list_max_tokens, 1000);
        assert_eq!(assistant.tts_model, "tts-1-hd");
        assert_eq!(assistant.limits.max_bytes, 2048);
        assert!(!format!("{:?}", config).contains("sk-live"));
        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_values_are_rejected() {
        clear_env();
        std::env::set_var("RUST_LOG", "loud");
        assert!(matches!(Config::from_env(), Err(ConfigError::InvalidValue(var, _)) if var == "RUST_LOG"));
        clear_env();

        std::env::set_var("MAX_UPLOAD_BYTES", "-1");
        assert!(Config::from_env().is_err());
        clear_env();

        std::env::set_var("TTS_MODEL", "whisper-1");
        assert!(Config::from_env().is_err());
        clear_env();
    }
}
