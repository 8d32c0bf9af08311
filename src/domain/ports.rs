use crate::domain::types::{Candle, MarketSnapshot, Ticker24h};
use anyhow::Result;
use async_trait::async_trait;

/// Uniform contract every venue adapter implements. Every network call made
/// to satisfy these methods must pass through the caller's rate limiter and
/// retry executor (§4.4) — this trait only describes the venue-facing shape.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Stable identifier for logging and error attribution.
    fn name(&self) -> &str;

    /// Opens sessions, loads symbol metadata, verifies connectivity. May be
    /// invoked lazily by the other methods.
    async fn initialize(&self) -> Result<()>;

    /// Releases sessions, sockets, and tokens held by this adapter.
    async fn disconnect(&self) -> Result<()>;

    /// Cheap liveness check. `false` if not yet initialized.
    async fn is_healthy(&self) -> bool;

    async fn get_market_snapshot(&self, symbol: &str) -> Result<MarketSnapshot>;

    /// Ascending-ordered candles, aligned to `interval`, length ≤ `limit`.
    async fn get_candles(&self, symbol: &str, interval: &str, limit: usize) -> Result<Vec<Candle>>;

    async fn get_ticker_24h(&self, symbol: &str) -> Result<Ticker24h>;
}
