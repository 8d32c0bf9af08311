//! Provider configuration parsing from environment variables.
//!
//! Handles the two reference venue adapters: the crypto spot/futures venue
//! and the CFD broker.

use std::env;
use std::time::Duration;

/// Crypto spot/futures venue configuration.
#[derive(Debug, Clone)]
pub struct BinanceEnvConfig {
    pub api_key: String,
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for BinanceEnvConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.binance.com".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl BinanceEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            api_key: env::var("BINANCE_API_KEY").unwrap_or_default(),
            base_url: env::var("BINANCE_BASE_URL").unwrap_or(defaults.base_url),
            request_timeout_ms: env::var("BINANCE_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_ms),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// CFD broker venue configuration.
#[derive(Debug, Clone, Default)]
pub struct BrokerEnvConfig {
    pub username: String,
    pub password: String,
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl BrokerEnvConfig {
    pub fn from_env() -> Self {
        Self {
            username: env::var("BROKER_USERNAME").unwrap_or_default(),
            password: env::var("BROKER_PASSWORD").unwrap_or_default(),
            base_url: env::var("BROKER_BASE_URL")
                .unwrap_or_else(|_| "https://demo-api.broker.example".to_string()),
            request_timeout_ms: env::var("BROKER_REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Aggregated provider configuration.
#[derive(Debug, Clone, Default)]
pub struct ProviderEnvConfig {
    pub binance: BinanceEnvConfig,
    pub broker: BrokerEnvConfig,
}

impl ProviderEnvConfig {
    pub fn from_env() -> Self {
        Self {
            binance: BinanceEnvConfig::from_env(),
            broker: BrokerEnvConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binance_config_defaults() {
        let config = BinanceEnvConfig::default();
        assert!(config.base_url.contains("binance.com"));
        assert_eq!(config.request_timeout_ms, 30_000);
    }

    #[test]
    fn test_broker_config_defaults() {
        let config = BrokerEnvConfig::from_env();
        assert!(!config.base_url.is_empty());
    }
}
