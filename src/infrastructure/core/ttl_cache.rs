use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

const DEFAULT_TTL: Duration = Duration::from_secs(60);
const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(30);

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

struct Inner<V> {
    entries: Mutex<HashMap<String, Entry<V>>>,
}

/// Keyed in-memory store with per-entry expiry and a periodic sweep. Opt-in:
/// providers may bypass it entirely. The sweeper is owned by this instance
/// and stopped when it is dropped.
pub struct TtlCache<V> {
    inner: Arc<Inner<V>>,
    sweeper: JoinHandle<()>,
}

impl<V: Send + 'static> TtlCache<V> {
    pub fn new() -> Self {
        Self::with_cleanup_interval(DEFAULT_CLEANUP_INTERVAL)
    }

    pub fn with_cleanup_interval(cleanup_interval: Duration) -> Self {
        let inner = Arc::new(Inner {
            entries: Mutex::new(HashMap::new()),
        });

        let sweep_inner = Arc::clone(&inner);
        let sweeper = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(cleanup_interval);
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let mut entries = sweep_inner.entries.lock().await;
                let before = entries.len();
                entries.retain(|_, entry| entry.expires_at > now);
                let swept = before - entries.len();
                if swept > 0 {
                    debug!(swept, "TtlCache: periodic sweep evicted expired entries");
                }
            }
        });

        Self { inner, sweeper }
    }

    pub async fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let mut entries = self.inner.entries.lock().await;
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    pub async fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(DEFAULT_TTL);
        let mut entries = self.inner.entries.lock().await;
        entries.insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    pub async fn delete(&self, key: &str) {
        self.inner.entries.lock().await.remove(key);
    }

    pub async fn clear(&self) {
        self.inner.entries.lock().await.clear();
    }
}

impl<V> Drop for TtlCache<V> {
    fn drop(&mut self) {
        self.sweeper.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_absent_key_returns_none() {
        let cache: TtlCache<String> = TtlCache::new();
        assert_eq!(cache.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_set_then_get_roundtrip() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.set("a", 42, Some(Duration::from_secs(60))).await;
        assert_eq!(cache.get("a").await, Some(42));
    }

    #[tokio::test]
    async fn test_expired_entry_is_evicted_on_get() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.set("a", 1, Some(Duration::from_millis(10))).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("a").await, None);
    }

    #[tokio::test]
    async fn test_delete_and_clear() {
        let cache: TtlCache<i32> = TtlCache::new();
        cache.set("a", 1, None).await;
        cache.set("b", 2, None).await;
        cache.delete("a").await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, Some(2));
        cache.clear().await;
        assert_eq!(cache.get("b").await, None);
    }
}
