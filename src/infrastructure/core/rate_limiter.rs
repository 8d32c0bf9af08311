use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;
use tracing::warn;

/// Safety cap on unsuccessful polls inside `wait_for_slot`, guarding against
/// unbounded blocking under clock skew or a misconfigured refill rate.
const MAX_WAIT_POLLS: u32 = 100;

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// Token-bucket admission control shared across every adapter call for one
/// venue. Safe under concurrent callers: consumption is serialized behind
/// an internal mutex.
pub struct RateLimiter {
    max_tokens: f64,
    refill_rate_per_sec: f64,
    wait_interval: Duration,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    pub fn new(max_tokens: u32, window: Duration) -> Self {
        let max_tokens = max_tokens as f64;
        let refill_rate_per_sec = max_tokens / window.as_secs_f64();
        Self {
            max_tokens,
            refill_rate_per_sec,
            wait_interval: Duration::from_millis(100),
            state: Mutex::new(BucketState {
                tokens: max_tokens,
                last_refill: Instant::now(),
            }),
        }
    }

    pub fn with_wait_interval(mut self, wait_interval: Duration) -> Self {
        self.wait_interval = wait_interval;
        self
    }

    fn refill_locked(&self, state: &mut BucketState) {
        let now = Instant::now();
        if now > state.last_refill {
            let elapsed = now.duration_since(state.last_refill).as_secs_f64();
            state.tokens = (state.tokens + elapsed * self.refill_rate_per_sec).min(self.max_tokens);
            state.last_refill = now;
        } else {
            // Clock regressed: only move the refill anchor forward, never
            // manufacture tokens from negative elapsed time.
            state.last_refill = now;
        }
    }

    /// Refills, then reports whether at least one token is available.
    pub async fn check(&self) -> bool {
        let mut state = self.state.lock().await;
        self.refill_locked(&mut state);
        state.tokens >= 1.0
    }

    /// Blocks until a token is available, then consumes one. After
    /// `MAX_WAIT_POLLS` unsuccessful polls, logs a warning and proceeds
    /// anyway rather than blocking forever (§4.1, §7 `RateLimitStall`).
    pub async fn wait_for_slot(&self) {
        for _ in 0..MAX_WAIT_POLLS {
            {
                let mut state = self.state.lock().await;
                self.refill_locked(&mut state);
                if state.tokens >= 1.0 {
                    state.tokens = (state.tokens - 1.0).max(0.0);
                    return;
                }
            }
            sleep(self.wait_interval).await;
        }

        warn!(
            "RateLimiter: safety cap of {} polls reached without a free slot, proceeding anyway",
            MAX_WAIT_POLLS
        );
        let mut state = self.state.lock().await;
        state.tokens = (state.tokens - 1.0).max(0.0);
    }

    /// Floor of the tokens currently available.
    pub async fn remaining(&self) -> u32 {
        let mut state = self.state.lock().await;
        self.refill_locked(&mut state);
        state.tokens.floor() as u32
    }

    /// Instant at which the bucket will next be full.
    pub async fn reset_time(&self) -> Instant {
        let state = self.state.lock().await;
        let tokens_needed = self.max_tokens - state.tokens;
        if tokens_needed <= 0.0 {
            state.last_refill
        } else {
            let seconds_needed = tokens_needed / self.refill_rate_per_sec;
            state.last_refill + Duration::from_secs_f64(seconds_needed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_consecutive_waits_drain_tokens() {
        let limiter = RateLimiter::new(10, Duration::from_secs(60));
        for _ in 0..5 {
            limiter.wait_for_slot().await;
        }
        assert_eq!(limiter.remaining().await, 5);
    }

    #[tokio::test]
    async fn test_tokens_never_go_negative() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60)).with_wait_interval(Duration::from_millis(1));
        limiter.wait_for_slot().await;
        limiter.wait_for_slot().await;
        // A third immediate consumption must not underflow; remaining floors at 0.
        assert_eq!(limiter.remaining().await, 0);
    }

    #[tokio::test]
    async fn test_check_reports_availability_without_consuming() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check().await);
        assert_eq!(limiter.remaining().await, 3);
    }
}
