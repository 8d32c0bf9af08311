use thiserror::Error;

/// Errors surfaced by the core. The limiter's safety-cap stall is
/// deliberately not a variant here: per §7 it is warned and execution
/// proceeds, it is never propagated to a caller.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Retryable network/HTTP failure. Retried up to `retryAttempts` with
    /// linear backoff by `RetryExecutor`; once attempts are exhausted the
    /// caller surfaces it as `FetchFailure`.
    #[error("Transport failure calling {provider}: {cause}")]
    TransportFailure { provider: String, cause: String },

    #[error("Fetch failed for {symbol}: {cause}")]
    FetchFailure { symbol: String, cause: String },

    #[error("Provider {provider} is unhealthy: {reason}")]
    ProviderUnhealthy { provider: String, reason: String },

    #[error("Period filter yielded no candles for {symbol}")]
    EmptyPeriod { symbol: String },

    #[error("Invalid candle data for {symbol}: {reason}")]
    InvalidCandleData { symbol: String, reason: String },

    #[error("Reference level calculation failed for {symbol}: {cause}")]
    ReferenceFailure { symbol: String, cause: String },
}
