//! # Gateway Configuration
//!
//! Configuration is loaded from environment variables. Both values are
//! required at startup: a missing or malformed value is a visible
//! configuration error, never a silent failure later on.

use std::env;

use serde::{Deserialize, Serialize};
use url::Url;

/// Environment variable holding the gateway endpoint URL.
pub const ENV_GATEWAY_URL: &str = "LOJA_GATEWAY_URL";

/// Environment variable holding the public (anonymous) API key.
pub const ENV_GATEWAY_ANON_KEY: &str = "LOJA_GATEWAY_ANON_KEY";

/// Remote gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Gateway endpoint, e.g. `https://myproject.example.co`.
    pub url: String,

    /// Public API key sent as the `apikey` header on every request.
    pub anon_key: String,
}

impl GatewayConfig {
    /// Creates a configuration after validating the endpoint URL.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let anon_key = anon_key.into();

        let parsed = Url::parse(&url).map_err(|e| ConfigError::InvalidValue {
            name: ENV_GATEWAY_URL.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidValue {
                name: ENV_GATEWAY_URL.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        if anon_key.trim().is_empty() {
            return Err(ConfigError::MissingRequired(ENV_GATEWAY_ANON_KEY.to_string()));
        }

        Ok(GatewayConfig {
            url: url.trim_end_matches('/').to_string(),
            anon_key,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// ## Required
    /// - `LOJA_GATEWAY_URL`
    /// - `LOJA_GATEWAY_ANON_KEY`
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var(ENV_GATEWAY_URL)
            .map_err(|_| ConfigError::MissingRequired(ENV_GATEWAY_URL.to_string()))?;
        let anon_key = env::var(ENV_GATEWAY_ANON_KEY)
            .map_err(|_| ConfigError::MissingRequired(ENV_GATEWAY_ANON_KEY.to_string()))?;

        GatewayConfig::new(url, anon_key)
    }
}

/// Configuration error types.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config() {
        let config = GatewayConfig::new("https://myproject.example.co/", "anon-key").unwrap();
        // trailing slash is normalized away
        assert_eq!(config.url, "https://myproject.example.co");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let err = GatewayConfig::new("not a url", "anon-key").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_empty_key_is_rejected() {
        let err = GatewayConfig::new("https://x.example.co", "  ").unwrap_err();
        assert!(matches!(err, ConfigError::MissingRequired(_)));
    }
}
