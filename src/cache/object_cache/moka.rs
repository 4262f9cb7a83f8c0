use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::{Expiry, future::Cache};
use tracing::debug;

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("moka", MokaObjectCache);

/// 值与其 TTL（秒，0 表示使用默认值）
type Entry = (String, u64);

struct EntryExpiry {
    default_ttl: Duration,
}

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, value: &Entry, _now: Instant) -> Option<Duration> {
        match value.1 {
            0 => Some(self.default_ttl),
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

pub struct MokaObjectCache {
    inner: Cache<String, Entry>,
}

impl MokaObjectCache {
    pub fn new() -> Result<Self, String> {
        let config = AppConfig::get();
        Ok(Self::with_settings(
            config.cache.memory.max_capacity,
            config.cache.default_ttl,
        ))
    }

    pub fn with_settings(max_capacity: u64, default_ttl: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(EntryExpiry {
                default_ttl: Duration::from_secs(default_ttl),
            })
            .build();

        debug!(
            "Moka cache ready (capacity {}, default TTL {}s)",
            max_capacity, default_ttl
        );
        Self { inner }
    }
}

#[async_trait]
impl ObjectCache for MokaObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        match self.inner.get(key).await {
            Some((value, _)) => CacheResult::Found(value),
            None => CacheResult::NotFound,
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        self.inner.insert(key, (value, ttl)).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_get_remove() {
        let cache = MokaObjectCache::with_settings(100, 60);
        cache
            .insert_raw("user:1".into(), "{\"id\":1}".into(), 0)
            .await;
        assert_eq!(
            cache.get_raw("user:1").await,
            CacheResult::Found("{\"id\":1}".to_string())
        );

        cache.remove("user:1").await;
        assert_eq!(cache.get_raw("user:1").await, CacheResult::NotFound);
    }

    #[tokio::test]
    async fn test_json_helpers() {
        let cache: Box<dyn ObjectCache> = Box::new(MokaObjectCache::with_settings(100, 60));
        cache.insert_json("n".into(), &vec![1, 2, 3], 0).await;
        assert_eq!(cache.get_json::<Vec<i32>>("n").await, Some(vec![1, 2, 3]));
        assert_eq!(cache.get_json::<Vec<i32>>("missing").await, None);
    }
}
