use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use corrcrack::domain::ports::MarketDataProvider;
use corrcrack::domain::strategy::{CorrelationCrackStrategy, StrategyConfig};
use corrcrack::domain::types::{
    Candle, CrossDirection, Interval, MarketSnapshot, PeriodSpec, Ticker24h,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A provider backed by a fixed candle series per symbol, standing in for a
/// real venue adapter in end-to-end tests of the strategy against the
/// public API surface.
struct FixtureProvider {
    series: Mutex<HashMap<String, Vec<Candle>>>,
}

#[async_trait]
impl MarketDataProvider for FixtureProvider {
    fn name(&self) -> &str {
        "fixture"
    }
    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }
    async fn disconnect(&self) -> anyhow::Result<()> {
        Ok(())
    }
    async fn is_healthy(&self) -> bool {
        true
    }
    async fn get_market_snapshot(&self, _symbol: &str) -> anyhow::Result<MarketSnapshot> {
        unimplemented!("not exercised by these scenarios")
    }
    async fn get_candles(
        &self,
        symbol: &str,
        _interval: &str,
        _limit: usize,
    ) -> anyhow::Result<Vec<Candle>> {
        self.series
            .lock()
            .unwrap()
            .get(symbol)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no fixture candles for {symbol}"))
    }
    async fn get_ticker_24h(&self, _symbol: &str) -> anyhow::Result<Ticker24h> {
        unimplemented!("not exercised by these scenarios")
    }
}

fn hourly_series(closes: &[f64], base: DateTime<Utc>) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open_time = base + Duration::hours(i as i64);
            let close = Decimal::from_f64_retain(close).unwrap();
            Candle {
                symbol: "X".to_string(),
                open_time,
                close_time: open_time + Duration::hours(1) - Duration::milliseconds(1),
                open: close,
                high: close + dec!(0.0005),
                low: close - dec!(0.0005),
                close,
                volume: dec!(1000),
                trades: None,
            }
        })
        .collect()
}

#[tokio::test]
async fn test_three_asset_group_with_one_crossing_fires_with_two_held() {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut map = HashMap::new();
    map.insert(
        "EURUSD".to_string(),
        hourly_series(&[1.1100, 1.1090, 1.1080, 1.1070, 1.1060, 1.1030], base),
    );
    map.insert(
        "GBPUSD".to_string(),
        hourly_series(&[1.2900, 1.2890, 1.2880, 1.2870, 1.2850, 1.2820], base),
    );
    map.insert(
        "AUDUSD".to_string(),
        hourly_series(&[0.6600, 0.6590, 0.6580, 0.6570, 0.6550, 0.6520], base),
    );

    let provider = Arc::new(FixtureProvider {
        series: Mutex::new(map),
    });
    let strategy = CorrelationCrackStrategy::new(provider);

    let mut config = StrategyConfig::new(
        vec!["EURUSD".to_string(), "GBPUSD".to_string(), "AUDUSD".to_string()],
        PeriodSpec::Rolling {
            periods: 5,
            interval: Interval::OneHour,
        },
        CrossDirection::CrossUnder,
    );
    config.market_data_interval = Interval::OneHour;
    config.candles_limit = 10;
    config.min_correlated_assets = 2;

    let result = strategy.run(&config).await;

    assert!(result.success);
    assert_eq!(result.conditions.len(), 3);
    let signal = result.signal.expect("expected a signal with two assets held");
    assert_eq!(signal.trigger_asset, "EURUSD");
    assert_eq!(signal.correlated_assets.len(), 2);
    assert!(signal.confidence > 0.5 && signal.confidence <= 1.0);
}

#[tokio::test]
async fn test_min_correlated_assets_suppresses_signal_when_not_enough_held() {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut map = HashMap::new();
    map.insert(
        "EURUSD".to_string(),
        hourly_series(&[1.1100, 1.1090, 1.1080, 1.1070, 1.1060, 1.1030], base),
    );
    map.insert(
        "GBPUSD".to_string(),
        hourly_series(&[1.2900, 1.2890, 1.2880, 1.2870, 1.2850, 1.2820], base),
    );

    let provider = Arc::new(FixtureProvider {
        series: Mutex::new(map),
    });
    let strategy = CorrelationCrackStrategy::new(provider);

    let mut config = StrategyConfig::new(
        vec!["EURUSD".to_string(), "GBPUSD".to_string()],
        PeriodSpec::Rolling {
            periods: 5,
            interval: Interval::OneHour,
        },
        CrossDirection::CrossUnder,
    );
    config.market_data_interval = Interval::OneHour;
    config.candles_limit = 10;
    config.min_correlated_assets = 2;

    let result = strategy.run(&config).await;

    assert!(result.success);
    assert!(result.signal.is_none());
}

#[tokio::test]
async fn test_fetch_failure_for_one_asset_aborts_whole_run() {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut map = HashMap::new();
    map.insert(
        "EURUSD".to_string(),
        hourly_series(&[1.1100, 1.1090, 1.1080], base),
    );
    // GBPUSD deliberately missing from the fixture to simulate a fetch failure.

    let provider = Arc::new(FixtureProvider {
        series: Mutex::new(map),
    });
    let strategy = CorrelationCrackStrategy::new(provider);

    let mut config = StrategyConfig::new(
        vec!["EURUSD".to_string(), "GBPUSD".to_string()],
        PeriodSpec::Rolling {
            periods: 3,
            interval: Interval::OneHour,
        },
        CrossDirection::CrossUnder,
    );
    config.market_data_interval = Interval::OneHour;
    config.candles_limit = 10;

    let result = strategy.run(&config).await;

    assert!(!result.success);
    assert!(result.error.as_deref().unwrap_or_default().contains("GBPUSD"));
    assert!(result.conditions.is_empty());
}
