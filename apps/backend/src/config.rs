//! Environment-based configuration.

use std::time::Duration;

use anyhow::Context;

use crate::services::generator::AnthropicConfig;
use crate::services::retry::RetryPolicy;

/// Upper bound accepted for `MAX_RETRIES`.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub anthropic: AnthropicConfig,
    pub max_retries: u32,
    pub session_ttl: Duration,
}

impl Config {
    /// Read configuration from process environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`, applying defaults for unset keys.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let port = get("PORT", "3000")
            .parse::<u16>()
            .context("PORT must be a valid port number")?;
        let max_retries = get("MAX_RETRIES", "3")
            .parse::<u32>()
            .context("MAX_RETRIES must be a non-negative integer")?;
        if max_retries > MAX_RETRIES_LIMIT {
            anyhow::bail!("MAX_RETRIES must be at most {MAX_RETRIES_LIMIT}, got {max_retries}");
        }

        let session_ttl_secs = get("SESSION_TTL_SECS", "3600")
            .parse::<u64>()
            .context("SESSION_TTL_SECS must be a non-negative integer")?;

        let anthropic = AnthropicConfig::new(get("ANTHROPIC_API_KEY", ""))
            .with_base_url(get("ANTHROPIC_BASE_URL", AnthropicConfig::DEFAULT_BASE_URL))
            .with_model(get("ANTHROPIC_MODEL", AnthropicConfig::DEFAULT_MODEL));

        Ok(Self {
            database_url: get("DATABASE_URL", "sqlite://flashcards.db"),
            host: get("HOST", "0.0.0.0"),
            port,
            anthropic,
            max_retries,
            session_ttl: Duration::from_secs(session_ttl_secs),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_retries(self.max_retries)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
