use crate::domain::ports::MarketDataProvider;
use crate::domain::time::{ceil_to_interval_end, floor_to_interval};
use crate::domain::types::{Candle, Interval, MarketSnapshot, Ticker24h};
use crate::infrastructure::core::http_client_factory::build_url_with_query;
use crate::infrastructure::core::{HttpClientFactory, RateLimiter, RetryExecutor, TtlCache};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Crypto spot/futures venue adapter (Binance-shaped REST surface). Every
/// network call passes through `wait_for_slot` then the retry executor.
pub struct BinanceMarketDataProvider {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    rate_limiter: Arc<RateLimiter>,
    retry_executor: RetryExecutor,
    cache: Option<Arc<TtlCache<Vec<Candle>>>>,
    healthy: AtomicBool,
}

impl BinanceMarketDataProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        rate_limiter: Arc<RateLimiter>,
        retry_executor: RetryExecutor,
        cache: Option<Arc<TtlCache<Vec<Candle>>>>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client: HttpClientFactory::create_client(request_timeout),
            base_url: base_url.into(),
            api_key: api_key.into(),
            rate_limiter,
            retry_executor,
            cache,
            healthy: AtomicBool::new(false),
        }
    }

    fn cache_key(symbol: &str, interval: &str, limit: usize) -> String {
        format!("binance:{symbol}:{interval}:{limit}")
    }

    async fn fetch_klines(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        let url = format!("{}/api/v3/klines", self.base_url);
        let limit_str = limit.to_string();
        let url_with_query = build_url_with_query(
            &url,
            &[("symbol", symbol), ("interval", interval), ("limit", &limit_str)],
        );

        let response = self
            .client
            .get(&url_with_query)
            .header("X-MBX-APIKEY", &self.api_key)
            .send()
            .await
            .context("Failed to fetch klines from Binance")?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            anyhow::bail!("Binance klines fetch failed: {}", error_text);
        }

        let klines: Vec<serde_json::Value> = response
            .json()
            .await
            .context("Failed to parse Binance klines response")?;

        let interval_enum = Interval::from_str(interval).unwrap_or(Interval::OneMin);

        let candles: Vec<Candle> = klines
            .into_iter()
            .filter_map(|k| {
                let arr = k.as_array()?;
                if arr.len() < 6 {
                    return None;
                }
                let open_ms = arr[0].as_i64()?;
                let open = parse_decimal(&arr[1])?;
                let high = parse_decimal(&arr[2])?;
                let low = parse_decimal(&arr[3])?;
                let close = parse_decimal(&arr[4])?;
                let volume = parse_decimal(&arr[5])?;

                let open_time = Utc.timestamp_millis_opt(open_ms).single()?;
                let aligned_open = floor_to_interval(open_time, interval_enum);
                let close_time = ceil_to_interval_end(aligned_open, interval_enum);

                Some(Candle {
                    symbol: symbol.to_string(),
                    open_time: aligned_open,
                    close_time,
                    open,
                    high,
                    low,
                    close,
                    volume,
                    trades: arr.get(8).and_then(|v| v.as_u64()),
                })
            })
            .collect();

        Ok(candles)
    }
}

fn parse_decimal(value: &serde_json::Value) -> Option<Decimal> {
    value.as_str()?.parse::<Decimal>().ok()
}

#[async_trait]
impl MarketDataProvider for BinanceMarketDataProvider {
    fn name(&self) -> &str {
        "binance"
    }

    async fn initialize(&self) -> Result<()> {
        let url = format!("{}/api/v3/ping", self.base_url);
        let response = self.client.get(&url).send().await.context("Binance ping failed")?;
        if response.status().is_success() {
            self.healthy.store(true, Ordering::SeqCst);
            info!("BinanceMarketDataProvider: initialized");
            Ok(())
        } else {
            self.healthy.store(false, Ordering::SeqCst);
            anyhow::bail!("Binance ping returned status {}", response.status())
        }
    }

    async fn disconnect(&self) -> Result<()> {
        self.healthy.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::SeqCst)
    }

    async fn get_market_snapshot(&self, symbol: &str) -> Result<MarketSnapshot> {
        self.rate_limiter.wait_for_slot().await;
        let symbol = symbol.to_string();
        let result = self
            .retry_executor
            .execute(|| {
                let symbol = symbol.clone();
                async move {
                    let url = format!("{}/api/v3/ticker/price", self.base_url);
                    let url_with_query = build_url_with_query(&url, &[("symbol", symbol.as_str())]);
                    let response = self
                        .client
                        .get(&url_with_query)
                        .send()
                        .await
                        .context("Failed to fetch price from Binance")?;

                    #[derive(Deserialize)]
                    struct PriceTicker {
                        symbol: String,
                        price: String,
                    }
                    let ticker: PriceTicker =
                        response.json().await.context("Failed to parse Binance price")?;
                    let price = ticker.price.parse::<Decimal>().unwrap_or(Decimal::ZERO);
                    anyhow::Ok(MarketSnapshot {
                        symbol: ticker.symbol,
                        price,
                        volume: Decimal::ZERO,
                        timestamp: Utc::now(),
                        change_24h: None,
                        change_percent_24h: None,
                    })
                }
            })
            .await;
        result
    }

    async fn get_candles(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        let cache_key = Self::cache_key(symbol, interval, limit);
        if let Some(cache) = &self.cache
            && let Some(hit) = cache.get(&cache_key).await
        {
            debug!(symbol, interval, "BinanceMarketDataProvider: cache hit");
            return Ok(hit);
        }

        self.rate_limiter.wait_for_slot().await;
        let symbol = symbol.to_string();
        let interval = interval.to_string();
        let candles = self
            .retry_executor
            .execute(|| {
                let symbol = symbol.clone();
                let interval = interval.clone();
                async move { self.fetch_klines(&symbol, &interval, limit).await }
            })
            .await?;

        if let Some(cache) = &self.cache {
            cache.set(cache_key, candles.clone(), None).await;
        }

        Ok(candles)
    }

    async fn get_ticker_24h(&self, symbol: &str) -> Result<Ticker24h> {
        self.rate_limiter.wait_for_slot().await;
        let symbol = symbol.to_string();
        self.retry_executor
            .execute(|| {
                let symbol = symbol.clone();
                async move {
                    let url = format!("{}/api/v3/ticker/24hr", self.base_url);
                    let url_with_query = build_url_with_query(&url, &[("symbol", symbol.as_str())]);
                    let response = self
                        .client
                        .get(&url_with_query)
                        .header("X-MBX-APIKEY", &self.api_key)
                        .send()
                        .await
                        .context("Failed to fetch 24hr ticker from Binance")?;

                    #[derive(Deserialize, Default)]
                    struct RawTicker24h {
                        symbol: String,
                        #[serde(rename = "lastPrice")]
                        last_price: Option<String>,
                        #[serde(rename = "volume")]
                        base_volume: Option<String>,
                        #[serde(rename = "quoteVolume")]
                        quote_volume: Option<String>,
                        #[serde(rename = "priceChange")]
                        price_change: Option<String>,
                        #[serde(rename = "priceChangePercent")]
                        price_change_percent: Option<String>,
                        #[serde(rename = "bidPrice")]
                        bid_price: Option<String>,
                        #[serde(rename = "askPrice")]
                        ask_price: Option<String>,
                        #[serde(rename = "openPrice")]
                        open_price: Option<String>,
                        #[serde(rename = "highPrice")]
                        high_price: Option<String>,
                        #[serde(rename = "lowPrice")]
                        low_price: Option<String>,
                        #[serde(rename = "weightedAvgPrice")]
                        weighted_avg_price: Option<String>,
                    }

                    let raw: RawTicker24h =
                        response.json().await.context("Failed to parse Binance 24hr ticker")?;

                    let zero_or = |s: Option<String>| {
                        s.and_then(|v| v.parse::<Decimal>().ok()).unwrap_or(Decimal::ZERO)
                    };

                    anyhow::Ok(Ticker24h {
                        symbol: raw.symbol,
                        last: zero_or(raw.last_price),
                        base_volume: zero_or(raw.base_volume),
                        quote_volume: zero_or(raw.quote_volume),
                        change: zero_or(raw.price_change),
                        percentage: zero_or(raw.price_change_percent),
                        bid: zero_or(raw.bid_price),
                        ask: zero_or(raw.ask_price),
                        open: zero_or(raw.open_price),
                        high: zero_or(raw.high_price),
                        low: zero_or(raw.low_price),
                        close: zero_or(raw.last_price.clone()),
                        vwap: zero_or(raw.weighted_avg_price),
                        timestamp: Utc::now(),
                    })
                }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_is_stable() {
        assert_eq!(
            BinanceMarketDataProvider::cache_key("BTCUSDT", "1h", 100),
            BinanceMarketDataProvider::cache_key("BTCUSDT", "1h", 100)
        );
        assert_ne!(
            BinanceMarketDataProvider::cache_key("BTCUSDT", "1h", 100),
            BinanceMarketDataProvider::cache_key("ETHUSDT", "1h", 100)
        );
    }
}
