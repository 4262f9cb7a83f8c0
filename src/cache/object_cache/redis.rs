use async_trait::async_trait;
use redis::{AsyncCommands, aio::MultiplexedConnection};
use tracing::{debug, error, warn};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("redis", RedisObjectCache);

pub struct RedisObjectCache {
    client: redis::Client,
    key_prefix: String,
    default_ttl: u64,
}

impl RedisObjectCache {
    pub fn new() -> Result<Self, String> {
        let config = AppConfig::get();
        let redis_config = &config.cache.redis;

        let client = redis::Client::open(redis_config.url.clone())
            .map_err(|e| format!("Invalid Redis URL {}: {e}", redis_config.url))?;

        // 启动时用同步连接 PING 一次，失败则由调用方回退到内存缓存
        let mut conn = client
            .get_connection()
            .map_err(|e| format!("Redis connection failed: {e}"))?;
        let pong: String = redis::cmd("PING")
            .query(&mut conn)
            .map_err(|e| format!("Redis ping failed: {e}"))?;
        debug!("Redis answered {} at {}", pong, redis_config.url);

        Ok(Self {
            client,
            key_prefix: redis_config.key_prefix.clone(),
            default_ttl: config.cache.default_ttl,
        })
    }

    async fn connection(&self) -> Option<MultiplexedConnection> {
        match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => Some(conn),
            Err(e) => {
                error!("Failed to get Redis connection: {}", e);
                None
            }
        }
    }

    fn make_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl ObjectCache for RedisObjectCache {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        let Some(mut conn) = self.connection().await else {
            return CacheResult::ExistsButNoValue;
        };

        match conn.get::<_, Option<String>>(self.make_key(key)).await {
            Ok(Some(data)) => CacheResult::Found(data),
            Ok(None) => CacheResult::NotFound,
            Err(e) => {
                error!("Failed to get key '{}': {}", key, e);
                CacheResult::ExistsButNoValue
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let Some(mut conn) = self.connection().await else {
            return;
        };

        let ttl = if ttl == 0 { self.default_ttl } else { ttl };
        if let Err(e) = conn
            .set_ex::<String, String, ()>(self.make_key(&key), value, ttl)
            .await
        {
            error!("Failed to insert key '{}' into cache: {}", key, e);
        }
    }

    async fn remove(&self, key: &str) {
        let Some(mut conn) = self.connection().await else {
            return;
        };

        if let Err(e) = conn.del::<String, i32>(self.make_key(key)).await {
            error!("Failed to remove key '{}': {}", key, e);
        }
    }

    async fn invalidate_all(&self) {
        warn!("Redis cache does not support invalidate_all, entries expire by TTL");
    }
}
