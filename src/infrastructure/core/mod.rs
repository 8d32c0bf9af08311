//! Cross-cutting infrastructure shared by every provider adapter: rate
//! limiting, TTL caching, retry, and HTTP client construction.

pub mod http_client_factory;
pub mod rate_limiter;
pub mod retry;
pub mod ttl_cache;

pub use http_client_factory::HttpClientFactory;
pub use rate_limiter::RateLimiter;
pub use retry::RetryExecutor;
pub use ttl_cache::TtlCache;
