//! Configuration module for corrcrack.
//!
//! Structured configuration loading from environment variables, organized
//! by domain: Provider, Strategy, and Runtime.

mod provider_config;
mod runtime_config;
mod strategy_config;

pub use provider_config::{BinanceEnvConfig, BrokerEnvConfig, ProviderEnvConfig};
pub use runtime_config::RuntimeEnvConfig;
pub use strategy_config::StrategyEnvConfig;

use crate::domain::strategy::StrategyConfig;
use anyhow::{Context, Result};

/// Aggregates every sub-config into the shape the binary wires up.
#[derive(Debug, Clone)]
pub struct Config {
    pub provider: ProviderEnvConfig,
    pub strategy: StrategyEnvConfig,
    pub runtime: RuntimeEnvConfig,
}

impl Config {
    /// Loads configuration from environment variables, composing each
    /// sub-config in turn.
    pub fn from_env() -> Result<Self> {
        let provider = ProviderEnvConfig::from_env();
        let strategy = StrategyEnvConfig::from_env().context("Failed to load strategy config")?;
        let runtime = RuntimeEnvConfig::from_env();

        Ok(Self {
            provider,
            strategy,
            runtime,
        })
    }

    /// Builds the domain-level `StrategyConfig` from the env-driven strategy
    /// section, filling in the remaining fields `StrategyConfig::new`
    /// defaults to.
    pub fn strategy_config(&self) -> StrategyConfig {
        let mut cfg = StrategyConfig::new(
            self.strategy.primary_assets.clone(),
            self.strategy.period.clone(),
            self.strategy.direction,
        );
        cfg.use_body_high_low = self.strategy.use_body_high_low;
        cfg.timezone = self.strategy.timezone;
        cfg.min_correlated_assets = self.strategy.min_correlated_assets;
        cfg.market_data_interval = self.strategy.market_data_interval;
        cfg.candles_limit = self.strategy.candles_limit;
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_config_carries_env_fields() {
        let config = Config {
            provider: ProviderEnvConfig::default(),
            strategy: StrategyEnvConfig {
                primary_assets: vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()],
                period: crate::domain::types::PeriodSpec::Named(
                    crate::domain::types::CalendarPeriod::PrevDay,
                ),
                direction: crate::domain::types::CrossDirection::CrossUnder,
                use_body_high_low: true,
                timezone: None,
                min_correlated_assets: 1,
                market_data_interval: crate::domain::types::Interval::FiveMin,
                candles_limit: 50,
            },
            runtime: RuntimeEnvConfig::default(),
        };

        let strategy_config = config.strategy_config();
        assert_eq!(strategy_config.primary_assets.len(), 2);
        assert!(strategy_config.use_body_high_low);
        assert_eq!(strategy_config.candles_limit, 50);
    }
}
