//! Runtime knobs for the cross-cutting infrastructure: rate limiter, TTL
//! cache, and retry executor.

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RuntimeEnvConfig {
    pub rate_limit_tokens: u32,
    pub rate_limit_window_ms: u64,
    pub cache_ttl_ms: u64,
    pub cache_cleanup_interval_ms: u64,
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub use_cache: bool,
}

impl Default for RuntimeEnvConfig {
    fn default() -> Self {
        Self {
            rate_limit_tokens: 1_200,
            rate_limit_window_ms: 60_000,
            cache_ttl_ms: 60_000,
            cache_cleanup_interval_ms: 30_000,
            retry_attempts: 3,
            retry_delay_ms: 1_000,
            use_cache: true,
        }
    }
}

impl RuntimeEnvConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rate_limit_tokens: env::var("RATE_LIMIT_TOKENS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rate_limit_tokens),
            rate_limit_window_ms: env::var("RATE_LIMIT_WINDOW_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rate_limit_window_ms),
            cache_ttl_ms: env::var("CACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_ttl_ms),
            cache_cleanup_interval_ms: env::var("CACHE_CLEANUP_INTERVAL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_cleanup_interval_ms),
            retry_attempts: env::var("RETRY_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retry_attempts),
            retry_delay_ms: env::var("RETRY_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.retry_delay_ms),
            use_cache: env::var("USE_CACHE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.use_cache),
        }
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_millis(self.rate_limit_window_ms)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    pub fn cache_cleanup_interval(&self) -> Duration {
        Duration::from_millis(self.cache_cleanup_interval_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_config_defaults() {
        let config = RuntimeEnvConfig::default();
        assert_eq!(config.rate_limit_tokens, 1_200);
        assert!(config.use_cache);
    }
}
