//! Engine configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CAMPO_CART_API_URL` - Base URL of the backend cart API
//! - `CAMPO_CATALOG_API_URL` - Base URL of the product catalog API
//! - `CAMPO_API_TOKEN` - Bearer token sent to both collaborators
//!
//! ## Optional
//! - `CAMPO_HTTP_TIMEOUT_SECS` - Per-request timeout (default: 10)
//! - `CAMPO_QUANTITY_DEBOUNCE_MS` - Delay before a line's mutation lock is
//!   released, to absorb duplicate rapid inputs (default: 150, capped at 300)

use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_QUANTITY_DEBOUNCE_MS: u64 = 150;

/// Hard ceiling on the quantity debounce. The lock may absorb duplicate
/// clicks but must not add more latency than this.
pub const MAX_QUANTITY_DEBOUNCE_MS: u64 = 300;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Cart engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Base URL of the backend cart API
    pub cart_api_url: Url,
    /// Base URL of the product catalog API
    pub catalog_api_url: Url,
    /// Bearer token for both collaborators
    pub api_token: SecretString,
    /// Per-request HTTP timeout
    pub http_timeout: Duration,
    /// Per-line lock release delay
    pub quantity_debounce: Duration,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let cart_api_url = required_url("CAMPO_CART_API_URL")?;
        let catalog_api_url = required_url("CAMPO_CATALOG_API_URL")?;
        let api_token = SecretString::from(required("CAMPO_API_TOKEN")?);

        let timeout_secs = optional_u64("CAMPO_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?;
        let debounce_ms = clamp_debounce(optional_u64(
            "CAMPO_QUANTITY_DEBOUNCE_MS",
            DEFAULT_QUANTITY_DEBOUNCE_MS,
        )?);

        Ok(Self {
            cart_api_url,
            catalog_api_url,
            api_token,
            http_timeout: Duration::from_secs(timeout_secs),
            quantity_debounce: Duration::from_millis(debounce_ms),
        })
    }
}

/// Cap a configured debounce at [`MAX_QUANTITY_DEBOUNCE_MS`].
#[must_use]
pub fn clamp_debounce(debounce_ms: u64) -> u64 {
    debounce_ms.min(MAX_QUANTITY_DEBOUNCE_MS)
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnvVar(name.to_string()))
}

fn required_url(name: &str) -> Result<Url, ConfigError> {
    let value = required(name)?;
    Url::parse(&value).map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string()))
}

fn optional_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidEnvVar(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_is_capped() {
        assert_eq!(clamp_debounce(150), 150);
        assert_eq!(clamp_debounce(300), 300);
        assert_eq!(clamp_debounce(5000), 300);
    }
}
