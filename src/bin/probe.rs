//! corrcrack-probe - headless smoke test harness
//!
//! Exercises the correlation-crack strategy end-to-end against a configured
//! provider for local verification. Not part of the library's public
//! contract; it exists only as an operational harness, the way the teacher's
//! `server` binary wraps `Application`.
//!
//! # Usage
//! ```sh
//! PRIMARY_ASSETS=BTCUSDT,ETHUSDT corrcrack-probe --venue binance
//! ```

use anyhow::Result;
use clap::{Parser, ValueEnum};
use corrcrack::config::Config;
use corrcrack::domain::strategy::CorrelationCrackStrategy;
use corrcrack::infrastructure::binance::BinanceMarketDataProvider;
use corrcrack::infrastructure::broker::BrokerMarketDataProvider;
use corrcrack::infrastructure::core::{RateLimiter, RetryExecutor, TtlCache};
use std::sync::Arc;
use std::time::Duration;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Venue {
    Binance,
    Broker,
}

#[derive(Parser, Debug)]
#[command(name = "corrcrack-probe", version, about = "Correlation-crack market-data smoke test")]
struct Args {
    #[arg(long, value_enum, default_value_t = Venue::Binance)]
    venue: Venue,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    let args = Args::parse();
    info!("corrcrack-probe {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        assets = ?config.strategy.primary_assets,
        direction = ?config.strategy.direction,
        "configuration loaded"
    );

    let rate_limiter = Arc::new(RateLimiter::new(
        config.runtime.rate_limit_tokens,
        config.runtime.rate_limit_window(),
    ));
    let retry_executor = RetryExecutor::new(config.runtime.retry_attempts, config.runtime.retry_delay());

    let provider: Arc<dyn corrcrack::domain::ports::MarketDataProvider> = match args.venue {
        Venue::Binance => {
            let cache = if config.runtime.use_cache {
                Some(Arc::new(TtlCache::with_cleanup_interval(
                    config.runtime.cache_cleanup_interval(),
                )))
            } else {
                None
            };
            Arc::new(BinanceMarketDataProvider::new(
                config.provider.binance.base_url.clone(),
                config.provider.binance.api_key.clone(),
                rate_limiter,
                retry_executor,
                cache,
                config.provider.binance.request_timeout(),
            ))
        }
        Venue::Broker => Arc::new(BrokerMarketDataProvider::new(
            config.provider.broker.base_url.clone(),
            config.provider.broker.username.clone(),
            config.provider.broker.password.clone(),
            rate_limiter,
            retry_executor,
            config.provider.broker.request_timeout(),
        )),
    };

    info!("initializing provider...");
    provider.initialize().await?;

    let strategy = CorrelationCrackStrategy::new(Arc::clone(&provider));
    let strategy_config = config.strategy_config();

    info!("running correlation-crack strategy...");
    let result = strategy.run(&strategy_config).await;

    if !result.success {
        tracing::error!(error = ?result.error, "strategy run failed");
    } else if let Some(signal) = result.signal {
        info!(
            trigger = %signal.trigger_asset,
            direction = %signal.direction,
            confidence = signal.confidence,
            correlated = ?signal.correlated_assets,
            "correlation crack signal fired"
        );
    } else {
        info!("strategy run completed, no signal this pass");
    }

    provider.disconnect().await?;
    Ok(())
}
