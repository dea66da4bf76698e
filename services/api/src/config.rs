//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Which service generates quest prompts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromptSourceConfig {
    /// The hosted backend's `generate-questions` edge function.
    EdgeFunction { backend_url: String, anon_key: String },
    /// An OpenAI-compatible chat model called directly.
    OpenAi { api_key: String, model: String },
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub cors_origin: String,
    pub prompt_source: PromptSourceConfig,
    pub prompt_timeout: Duration,
    pub settlement_delay: Duration,
    pub proof_secret: Option<String>,
    pub proof_ttl: Duration,
    pub bootstrap_max_attempts: u32,
    pub bootstrap_backoff: Duration,
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

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = required("DATABASE_URL")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin =
            std::env::var("CORS_ORIGIN").unwrap_or_else(|_| "http://localhost:8081".to_string());

        // --- Prompt Generation ---
        let source = std::env::var("PROMPT_SOURCE").unwrap_or_else(|_| "edge".to_string());
        let prompt_source = match source.to_lowercase().as_str() {
            "edge" => PromptSourceConfig::EdgeFunction {
                backend_url: required("BACKEND_URL")?.trim_end_matches('/').to_string(),
                anon_key: required("BACKEND_ANON_KEY")?,
            },
            "openai" => PromptSourceConfig::OpenAi {
                api_key: required("OPENAI_API_KEY")?,
                model: std::env::var("PROMPT_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            },
            other => {
                return Err(ConfigError::InvalidValue(
                    "PROMPT_SOURCE".to_string(),
                    format!("'{}' is not one of edge, openai", other),
                ))
            }
        };
        let prompt_timeout = Duration::from_millis(parsed("PROMPT_TIMEOUT_MS", 8_000)?);

        // --- Quest Flow ---
        let settlement_delay = Duration::from_millis(parsed("SETTLEMENT_DELAY_MS", 1_500)?);
        let proof_secret = std::env::var("PROOF_SECRET").ok().filter(|s| !s.is_empty());
        let proof_ttl = Duration::from_secs(parsed("PROOF_TTL_SECS", 600)?);

        // --- Account Bootstrap ---
        let bootstrap_max_attempts = parsed("BOOTSTRAP_MAX_ATTEMPTS", 3)?;
        let bootstrap_backoff = Duration::from_millis(parsed("BOOTSTRAP_BACKOFF_MS", 1_000)?);

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            cors_origin,
            prompt_source,
            prompt_timeout,
            settlement_delay,
            proof_secret,
            proof_ttl,
            bootstrap_max_attempts,
            bootstrap_backoff,
        })
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingVar(name.to_string()))
}

fn parsed<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
