//! Configuration loading and validation

use anyhow::{Context, Result, bail};
use blog_auth::MAX_TOKEN_TTL_SECS;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Session token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_access_secret")]
    pub access_secret: String,
    #[serde(default = "default_refresh_secret")]
    pub refresh_secret: String,
    #[serde(default = "default_access_token_ttl_secs")]
    pub access_token_ttl_secs: i64,
    #[serde(default = "default_refresh_token_ttl_secs")]
    pub refresh_token_ttl_secs: i64,
    /// Let a refresh token authenticate ordinary requests
    #[serde(default = "default_accept_refresh_as_bearer")]
    pub accept_refresh_as_bearer: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: default_access_secret(),
            refresh_secret: default_refresh_secret(),
            access_token_ttl_secs: default_access_token_ttl_secs(),
            refresh_token_ttl_secs: default_refresh_token_ttl_secs(),
            accept_refresh_as_bearer: default_accept_refresh_as_bearer(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_db_path() -> String {
    "./data/blog.db".to_string()
}

fn default_access_secret() -> String {
    "change-me-access-secret".to_string()
}

fn default_refresh_secret() -> String {
    "change-me-refresh-secret".to_string()
}

fn default_access_token_ttl_secs() -> i64 {
    15 * 60
}

fn default_refresh_token_ttl_secs() -> i64 {
    7 * 24 * 3600
}

fn default_accept_refresh_as_bearer() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &str) -> Result<Self> {
        let config_path = Path::new(path);

        // Check if config file exists
        if !config_path.exists() {
            info!("Config file not found at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path))?;

        info!("Loaded configuration from {}", path);
        Ok(config)
    }

    /// Reject settings the session layer cannot run with
    pub fn validate(&self) -> Result<()> {
        let auth = &self.auth;

        if auth.access_secret.is_empty() || auth.refresh_secret.is_empty() {
            bail!("auth.access_secret and auth.refresh_secret must not be empty");
        }
        if auth.access_secret == auth.refresh_secret {
            bail!("auth.access_secret and auth.refresh_secret must differ");
        }
        for (name, secs) in [
            ("access_token_ttl_secs", auth.access_token_ttl_secs),
            ("refresh_token_ttl_secs", auth.refresh_token_ttl_secs),
        ] {
            if !(1..=MAX_TOKEN_TTL_SECS).contains(&secs) {
                bail!(
                    "auth.{} must be between 1 and {} seconds, got {}",
                    name,
                    MAX_TOKEN_TTL_SECS,
                    secs
                );
            }
        }
        if auth.access_token_ttl_secs >= auth.refresh_token_ttl_secs {
            bail!(
                "auth.access_token_ttl_secs ({}) must be shorter than refresh_token_ttl_secs ({})",
                auth.access_token_ttl_secs,
                auth.refresh_token_ttl_secs
            );
        }
        if !matches!(self.logging.format.as_str(), "pretty" | "json") {
            bail!("Unknown logging.format '{}'", self.logging.format);
        }

        if auth.access_secret == default_access_secret()
            || auth.refresh_secret == default_refresh_secret()
        {
            warn!("Using a default token secret; set auth secrets before deploying");
        }
        Ok(())
    }
}
