//! Configuration management for the Inventory Management Platform
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (config/development.toml, config/production.toml)
//! 3. Environment variable overrides with IMS_ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// JWT authentication configuration
    pub jwt: JwtConfig,

    /// Generative AI configuration
    pub ai: AiConfig,

    /// Exchange rate service configuration
    pub exchange_rates: ExchangeRateConfig,

    /// Outbound email configuration; mail is disabled when absent
    #[serde(default)]
    pub mail: MailConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Minimum number of connections in the pool
    pub min_connections: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWT tokens
    pub secret: String,

    /// Access token expiration in seconds
    pub access_token_expiry: i64,

    /// Refresh token expiration in seconds
    pub refresh_token_expiry: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AiConfig {
    /// API key; the AI layer is disabled when absent
    pub api_key: Option<String>,

    /// Generative Language API base URL
    pub base_url: String,

    /// Models to try, most preferred first
    pub models: Vec<String>,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExchangeRateConfig {
    /// Base URL; rates are read from `{base_url}/latest/USD`
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// HTTP mail API endpoint
    pub api_endpoint: Option<String>,

    /// Mail API key
    pub api_key: Option<String>,

    /// Sender address
    pub from_address: Option<String>,

    /// Per-message timeout in seconds
    #[serde(default = "default_mail_timeout")]
    pub timeout_secs: u64,
}

fn default_mail_timeout() -> u64 {
    10
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            api_endpoint: None,
            api_key: None,
            from_address: None,
            timeout_secs: default_mail_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("IMS_ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 8000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("jwt.access_token_expiry", 3600)?
            .set_default("jwt.refresh_token_expiry", 604800)?
            .set_default("ai.base_url", "https://generativelanguage.googleapis.com/v1beta")?
            .set_default(
                "ai.models",
                vec![
                    "gemini-1.5-flash-latest",
                    "gemini-1.5-pro-latest",
                    "gemini-1.5-flash",
                    "gemini-1.5-pro",
                    "gemini-pro",
                ],
            )?
            .set_default("ai.timeout_secs", 10)?
            .set_default("exchange_rates.base_url", "https://api.exchangerate-api.com/v4")?
            .set_default("exchange_rates.timeout_secs", 5)?
            .set_default("mail.timeout_secs", default_mail_timeout())?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (IMS_ prefix)
            .add_source(
                Environment::with_prefix("IMS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("ai.models")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl MailConfig {
    /// Mail is only sent when endpoint, key and sender are all present
    pub fn is_complete(&self) -> bool {
        [&self.api_endpoint, &self.api_key, &self.from_address]
            .iter()
            .all(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()))
    }
}

impl AiConfig {
    /// The API key, if one is configured and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }
}
