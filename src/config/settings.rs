//! Client configuration settings
//!
//! Defines the configuration structures and their loading logic

use crate::utils::error::{helpers::config_error, ClientResult, ErrorContext};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Canonical Workers AI API root
pub const API_BASE_URL: &str = "https://api.cloudflare.com/client/v4/accounts";

/// Default number of transport-level retries
pub const DEFAULT_RETRIES: u32 = 1;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

pub const ENV_API_KEY: &str = "CLOUDFLARE_API_KEY";
pub const ENV_ACCOUNT_ID: &str = "CLOUDFLARE_ACCOUNT_ID";
pub const ENV_GATEWAY_URL: &str = "CLOUDFLARE_AI_GATEWAY_URL";
pub const ENV_RETRIES: &str = "CLOUDFLARE_AI_RETRIES";
pub const ENV_TIMEOUT: &str = "CLOUDFLARE_AI_TIMEOUT";

/// Immutable client configuration
///
/// Can only be obtained through [`ClientConfig::new`] or [`ClientConfigBuilder::build`],
/// both of which reject an empty API key or account identifier.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    api_key: String,
    account_identifier: String,
    gateway_url: Option<String>,
    retries: u32,
    timeout_seconds: u64,
}

impl ClientConfig {
    /// Create a configuration with default retries and timeout
    pub fn new(api_key: impl Into<String>, account_identifier: impl Into<String>) -> ClientResult<Self> {
        let config = Self {
            api_key: api_key.into(),
            account_identifier: account_identifier.into(),
            gateway_url: None,
            retries: DEFAULT_RETRIES,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        };
        config.validate()?;
        Ok(config)
    }

    /// Start an empty builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Load the whole configuration from the environment (and `.env`)
    pub fn from_env() -> ClientResult<Self> {
        ClientConfigBuilder::from_env()?.build()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn account_identifier(&self) -> &str {
        &self.account_identifier
    }

    pub fn gateway_url(&self) -> Option<&str> {
        self.gateway_url.as_deref()
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn timeout_seconds(&self) -> u64 {
        self.timeout_seconds
    }

    /// Base URL that model identifiers are appended to
    pub fn base_url(&self) -> String {
        match &self.gateway_url {
            Some(gateway) => gateway.clone(),
            None => format!("{}/{}/ai/run", API_BASE_URL, self.account_identifier),
        }
    }

    /// Validate configuration validity
    fn validate(&self) -> ClientResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(config_error("Cloudflare API key is required"));
        }

        if self.api_key.contains(char::is_whitespace) {
            return Err(config_error("Cloudflare API key cannot contain whitespace characters"));
        }

        if self.account_identifier.trim().is_empty() {
            return Err(config_error("Cloudflare account identifier is required"));
        }

        if let Some(gateway) = &self.gateway_url {
            if !gateway.starts_with("http://") && !gateway.starts_with("https://") {
                return Err(config_error(format!(
                    "Invalid AI Gateway URL format, should start with 'http://' or 'https://': {}",
                    gateway
                )));
            }
        }

        if self.timeout_seconds == 0 {
            return Err(config_error("Timeout cannot be 0"));
        }

        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &"[redacted]")
            .field("account_identifier", &self.account_identifier)
            .field("gateway_url", &self.gateway_url)
            .field("retries", &self.retries)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

/// Builder for [`ClientConfig`]
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    api_key: Option<String>,
    account_identifier: Option<String>,
    gateway_url: Option<String>,
    retries: Option<u32>,
    timeout_seconds: Option<u64>,
}

impl ClientConfigBuilder {
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn account_identifier(mut self, account_identifier: impl Into<String>) -> Self {
        self.account_identifier = Some(account_identifier.into());
        self
    }

    /// Route every request through an AI Gateway
    pub fn gateway_url(mut self, gateway_url: impl Into<String>) -> Self {
        self.gateway_url = Some(gateway_url.into());
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = Some(retries);
        self
    }

    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Seed a builder from environment variables (and `.env`)
    ///
    /// Values set afterwards through the builder methods take precedence.
    pub fn from_env() -> ClientResult<Self> {
        // Load .env file if it exists
        dotenv::dotenv().ok();

        let retries = get_env(ENV_RETRIES)
            .map(|value| value.parse::<u32>())
            .transpose()
            .config_context("Invalid retries value")?;

        let timeout_seconds = get_env(ENV_TIMEOUT)
            .map(|value| value.parse::<u64>())
            .transpose()
            .config_context("Invalid timeout value")?;

        Ok(Self {
            api_key: get_env(ENV_API_KEY),
            account_identifier: get_env(ENV_ACCOUNT_ID),
            gateway_url: get_env(ENV_GATEWAY_URL),
            retries,
            timeout_seconds,
        })
    }

    /// Build and validate the configuration
    pub fn build(self) -> ClientResult<ClientConfig> {
        let api_key = self.api_key.ok_or_else(|| {
            config_error(format!(
                "Cloudflare API key is required (pass it directly or set {})",
                ENV_API_KEY
            ))
        })?;

        let account_identifier = self.account_identifier.ok_or_else(|| {
            config_error(format!(
                "Cloudflare account identifier is required (pass it directly or set {})",
                ENV_ACCOUNT_ID
            ))
        })?;

        let gateway_url = self
            .gateway_url
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty());

        let config = ClientConfig {
            api_key,
            account_identifier,
            gateway_url,
            retries: self.retries.unwrap_or(DEFAULT_RETRIES),
            timeout_seconds: self.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS),
        };
        config.validate()?;

        debug!(
            "Client configuration loaded (gateway: {}, retries: {}, timeout: {}s)",
            config.gateway_url.is_some(),
            config.retries,
            config.timeout_seconds
        );
        Ok(config)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or `RUST_LOG` filter directive
    pub level: String,
    /// Log format (text/json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Read logging settings from `RUST_LOG` and `LOG_FORMAT`
    pub fn from_env() -> ClientResult<Self> {
        dotenv::dotenv().ok();

        let config = Self {
            level: get_env(ENV_LOG_LEVEL).unwrap_or_else(|| "info".to_string()),
            format: get_env(ENV_LOG_FORMAT).unwrap_or_else(|| "text".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ClientResult<()> {
        EnvFilter::try_new(&self.level)
            .map_err(|e| config_error(format!("Invalid log level: {} ({})", self.level, e)))?;

        let valid_formats = ["text", "json"];
        if !valid_formats.contains(&self.format.as_str()) {
            return Err(config_error(format!("Invalid log format: {}", self.format)));
        }

        Ok(())
    }

    pub fn is_json(&self) -> bool {
        self.format == "json"
    }
}

const ENV_LOG_LEVEL: &str = "RUST_LOG";
const ENV_LOG_FORMAT: &str = "LOG_FORMAT";

/// Get a non-empty environment variable
fn get_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
