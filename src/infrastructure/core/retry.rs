use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Wraps a fallible async operation with bounded attempts and linear
/// backoff (`retryDelay · attempt`, starting at attempt 1). Propagates the
/// last error once attempts are exhausted.
pub struct RetryExecutor {
    pub retry_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl RetryExecutor {
    pub fn new(retry_attempts: u32, retry_delay: Duration) -> Self {
        Self {
            retry_attempts,
            retry_delay,
        }
    }

    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt >= self.retry_attempts {
                        return Err(e);
                    }
                    warn!(attempt, cause = %e, "RetryExecutor: attempt failed, retrying");
                    tokio::time::sleep(self.retry_delay * attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}
