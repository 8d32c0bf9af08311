use crate::domain::ports::MarketDataProvider;
use crate::domain::time::{ceil_to_interval_end, floor_to_interval};
use crate::domain::types::{Candle, Interval, MarketSnapshot, Ticker24h};
use crate::infrastructure::core::http_client_factory::build_url_with_query;
use crate::infrastructure::core::{HttpClientFactory, RateLimiter, RetryExecutor};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(9 * 60);

#[derive(Debug, Clone)]
struct SessionTokens {
    auth_token: String,
    account_token: String,
}

struct SessionState {
    tokens: Option<SessionTokens>,
    keepalive: Option<JoinHandle<()>>,
}

/// CFD-broker venue adapter. Connecting performs the two-step handshake the
/// broker requires (encryption-key fetch, then a credentialed session
/// create) and keeps the session alive with a background ping every nine
/// minutes. `disconnect` tears the session down explicitly rather than
/// letting it expire server-side.
pub struct BrokerMarketDataProvider {
    client: ClientWithMiddleware,
    base_url: String,
    username: String,
    password: String,
    rate_limiter: Arc<RateLimiter>,
    retry_executor: RetryExecutor,
    state: Arc<RwLock<SessionState>>,
}

#[derive(Deserialize)]
struct EncryptionKeyResponse {
    #[serde(rename = "encryptionKey")]
    encryption_key: String,
}

#[derive(Deserialize)]
struct SessionCreateResponse {
    #[serde(rename = "oauthToken")]
    auth_token: String,
    #[serde(rename = "accountToken")]
    account_token: String,
}

impl BrokerMarketDataProvider {
    pub fn new(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        rate_limiter: Arc<RateLimiter>,
        retry_executor: RetryExecutor,
        request_timeout: Duration,
    ) -> Self {
        Self {
            client: HttpClientFactory::create_client(request_timeout),
            base_url: base_url.into(),
            username: username.into(),
            password: password.into(),
            rate_limiter,
            retry_executor,
            state: Arc::new(RwLock::new(SessionState {
                tokens: None,
                keepalive: None,
            })),
        }
    }

    async fn fetch_encryption_key(&self) -> Result<String> {
        let url = format!("{}/session/encryptionKey", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("username", self.username.as_str())])
            .send()
            .await
            .context("Failed to fetch broker encryption key")?;
        let body: EncryptionKeyResponse = response
            .json()
            .await
            .context("Failed to parse broker encryption key response")?;
        Ok(body.encryption_key)
    }

    /// The broker expects the password encrypted with the key fetched above.
    /// Real deployments RSA-encrypt with that key; this adapter's scope ends
    /// at the handshake shape, so the password is forwarded as-is alongside
    /// the key identifier.
    async fn create_session(&self, encryption_key: &str) -> Result<SessionTokens> {
        let url = format!("{}/session", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({
                "identifier": self.username,
                "password": self.password,
                "encryptionKey": encryption_key,
            }))
            .send()
            .await
            .context("Failed to create broker session")?;

        if !response.status().is_success() {
            anyhow::bail!("Broker session create returned status {}", response.status());
        }

        let body: SessionCreateResponse = response
            .json()
            .await
            .context("Failed to parse broker session create response")?;

        Ok(SessionTokens {
            auth_token: body.auth_token,
            account_token: body.account_token,
        })
    }

    async fn send_keepalive(client: &ClientWithMiddleware, base_url: &str, tokens: &SessionTokens) {
        let url = format!("{}/session/ping", base_url);
        let result = client
            .put(&url)
            .header("X-SECURITY-TOKEN", &tokens.account_token)
            .header("CST", &tokens.auth_token)
            .send()
            .await;
        match result {
            Ok(response) if response.status().is_success() => {
                info!("BrokerMarketDataProvider: keep-alive ping ok");
            }
            Ok(response) => warn!(status = %response.status(), "BrokerMarketDataProvider: keep-alive ping rejected"),
            Err(err) => warn!(cause = %err, "BrokerMarketDataProvider: keep-alive ping failed"),
        }
    }

    async fn auth_headers(&self) -> Result<(String, String)> {
        let guard = self.state.read().await;
        match &guard.tokens {
            Some(tokens) => Ok((tokens.account_token.clone(), tokens.auth_token.clone())),
            None => anyhow::bail!("BrokerMarketDataProvider: not connected"),
        }
    }
}

#[async_trait]
impl MarketDataProvider for BrokerMarketDataProvider {
    fn name(&self) -> &str {
        "cfd_broker"
    }

    async fn initialize(&self) -> Result<()> {
        let encryption_key = self.fetch_encryption_key().await?;
        let tokens = self.create_session(&encryption_key).await?;

        let client = self.client.clone();
        let base_url = self.base_url.clone();
        let keepalive_tokens = tokens.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(KEEPALIVE_INTERVAL);
            loop {
                ticker.tick().await;
                Self::send_keepalive(&client, &base_url, &keepalive_tokens).await;
            }
        });

        let mut guard = self.state.write().await;
        guard.tokens = Some(tokens);
        guard.keepalive = Some(handle);
        info!("BrokerMarketDataProvider: session established");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut guard = self.state.write().await;
        if let Some(handle) = guard.keepalive.take() {
            handle.abort();
        }
        if let Some(tokens) = guard.tokens.take() {
            let url = format!("{}/session", self.base_url);
            let _ = self
                .client
                .delete(&url)
                .header("X-SECURITY-TOKEN", &tokens.account_token)
                .header("CST", &tokens.auth_token)
                .send()
                .await;
        }
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        self.state.read().await.tokens.is_some()
    }

    async fn get_market_snapshot(&self, symbol: &str) -> Result<MarketSnapshot> {
        self.rate_limiter.wait_for_slot().await;
        let (security_token, cst) = self.auth_headers().await?;
        let symbol = symbol.to_string();
        self.retry_executor
            .execute(|| {
                let symbol = symbol.clone();
                let security_token = security_token.clone();
                let cst = cst.clone();
                async move {
                    let url = format!("{}/markets/{}", self.base_url, symbol);
                    let response = self
                        .client
                        .get(&url)
                        .header("X-SECURITY-TOKEN", &security_token)
                        .header("CST", &cst)
                        .send()
                        .await
                        .context("Failed to fetch broker market snapshot")?;

                    #[derive(Deserialize)]
                    struct MarketSnapshotResponse {
                        bid: f64,
                        offer: f64,
                    }
                    let body: MarketSnapshotResponse = response
                        .json()
                        .await
                        .context("Failed to parse broker market snapshot response")?;
                    let mid = (body.bid + body.offer) / 2.0;
                    let price = Decimal::from_str(&format!("{:.5}", mid)).unwrap_or(Decimal::ZERO);

                    anyhow::Ok(MarketSnapshot {
                        symbol: symbol.clone(),
                        price,
                        volume: Decimal::ZERO,
                        timestamp: Utc::now(),
                        change_24h: None,
                        change_percent_24h: None,
                    })
                }
            })
            .await
    }

    async fn get_candles(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>> {
        self.rate_limiter.wait_for_slot().await;
        let (security_token, cst) = self.auth_headers().await?;
        let symbol = symbol.to_string();
        let interval = interval.to_string();

        self.retry_executor
            .execute(|| {
                let symbol = symbol.clone();
                let interval = interval.clone();
                let security_token = security_token.clone();
                let cst = cst.clone();
                async move {
                    let url = format!("{}/prices/{}", self.base_url, symbol);
                    let limit_str = limit.to_string();
                    let url_with_query = build_url_with_query(
                        &url,
                        &[("resolution", broker_resolution(&interval)), ("max", limit_str.as_str())],
                    );
                    let response = self
                        .client
                        .get(&url_with_query)
                        .header("X-SECURITY-TOKEN", &security_token)
                        .header("CST", &cst)
                        .send()
                        .await
                        .context("Failed to fetch broker prices")?;

                    #[derive(Deserialize)]
                    struct PricePoint {
                        #[serde(rename = "snapshotTimeUTC")]
                        snapshot_time_utc: String,
                        #[serde(rename = "openPrice")]
                        open_price: PriceLevel,
                        #[serde(rename = "highPrice")]
                        high_price: PriceLevel,
                        #[serde(rename = "lowPrice")]
                        low_price: PriceLevel,
                        #[serde(rename = "closePrice")]
                        close_price: PriceLevel,
                        #[serde(rename = "lastTradedVolume")]
                        last_traded_volume: Option<Decimal>,
                    }
                    #[derive(Deserialize)]
                    struct PriceLevel {
                        bid: f64,
                        ask: f64,
                    }
                    #[derive(Deserialize)]
                    struct PricesResponse {
                        prices: Vec<PricePoint>,
                    }

                    let body: PricesResponse = response
                        .json()
                        .await
                        .context("Failed to parse broker prices response")?;

                    let interval_enum = Interval::from_str(&interval).unwrap_or(Interval::OneHour);
                    let candles: Vec<Candle> = body
                        .prices
                        .into_iter()
                        .filter_map(|p| {
                            let open_time = chrono::NaiveDateTime::parse_from_str(
                                &p.snapshot_time_utc,
                                "%Y:%m:%dT%H:%M:%S",
                            )
                            .ok()?
                            .and_utc();
                            let aligned_open = floor_to_interval(open_time, interval_enum);
                            let close_time = ceil_to_interval_end(aligned_open, interval_enum);

                            let mid = |level: &PriceLevel| (level.bid + level.ask) / 2.0;
                            let to_decimal =
                                |v: f64| Decimal::from_str(&format!("{:.5}", v)).unwrap_or(Decimal::ZERO);

                            Some(Candle {
                                symbol: symbol.clone(),
                                open_time: aligned_open,
                                close_time,
                                open: to_decimal(mid(&p.open_price)),
                                high: to_decimal(mid(&p.high_price)),
                                low: to_decimal(mid(&p.low_price)),
                                close: to_decimal(mid(&p.close_price)),
                                volume: p.last_traded_volume.unwrap_or(Decimal::ZERO),
                                trades: None,
                            })
                        })
                        .collect();

                    anyhow::Ok(candles)
                }
            })
            .await
    }

    async fn get_ticker_24h(&self, symbol: &str) -> Result<Ticker24h> {
        let snapshot = self.get_market_snapshot(symbol).await?;
        Ok(Ticker24h {
            symbol: snapshot.symbol,
            last: snapshot.price,
            base_volume: Decimal::ZERO,
            quote_volume: Decimal::ZERO,
            change: Decimal::ZERO,
            percentage: Decimal::ZERO,
            bid: Decimal::ZERO,
            ask: Decimal::ZERO,
            open: Decimal::ZERO,
            high: Decimal::ZERO,
            low: Decimal::ZERO,
            close: Decimal::ZERO,
            vwap: Decimal::ZERO,
            timestamp: snapshot.timestamp,
        })
    }
}

fn broker_resolution(interval: &str) -> &'static str {
    match interval {
        "1m" => "MINUTE",
        "5m" => "MINUTE_5",
        "15m" => "MINUTE_15",
        "30m" => "MINUTE_30",
        "1h" => "HOUR",
        "4h" => "HOUR_4",
        "1d" => "DAY",
        "1w" => "WEEK",
        _ => "HOUR",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_broker_resolution_maps_known_intervals() {
        assert_eq!(broker_resolution("1h"), "HOUR");
        assert_eq!(broker_resolution("1d"), "DAY");
    }

    #[test]
    fn test_broker_resolution_defaults_for_unknown() {
        assert_eq!(broker_resolution("7m"), "HOUR");
    }
}
