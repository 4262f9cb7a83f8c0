//! 对象缓存层
//!
//! 后端以插件形式注册（见 `register`），启动时按配置选择 Moka 或 Redis。

pub mod object_cache;
pub mod register;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
    // 后端出错时无法判断键是否存在
    ExistsButNoValue,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    /// `ttl` 为 0 时使用后端默认 TTL
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}

impl dyn ObjectCache {
    /// 读取并反序列化，反序列化失败视为未命中
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.get_raw(key).await {
            CacheResult::Found(raw) => serde_json::from_str(&raw).ok(),
            _ => None,
        }
    }

    pub async fn insert_json<T: Serialize + Sync>(&self, key: String, value: &T, ttl: u64) {
        if let Ok(raw) = serde_json::to_string(value) {
            self.insert_raw(key, raw, ttl).await;
        }
    }
}

/// 用户缓存键
pub fn user_cache_key(user_id: i64) -> String {
    format!("user:{user_id}")
}

/// 在程序加载时把缓存后端注册到插件表
///
/// 类型需要提供返回 `Result<Self, String>` 的 `new()`。
#[macro_export]
macro_rules! declare_object_cache_plugin {
    ($name:expr, $ty:ty) => {
        #[ctor::ctor]
        unsafe fn __register_object_cache_plugin() {
            $crate::cache::register::register_object_cache_plugin(
                $name,
                std::sync::Arc::new(|| {
                    Box::pin(async {
                        <$ty>::new()
                            .map(|cache| {
                                Box::new(cache) as Box<dyn $crate::cache::ObjectCache>
                            })
                            .map_err(|e| $crate::errors::AttendifyError::cache_connection(e))
                    })
                }),
            );
        }
    };
}
