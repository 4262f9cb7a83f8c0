//! 缓存插件注册表

use crate::cache::ObjectCache;
use crate::errors::Result;
use once_cell::sync::Lazy;
use std::{
    collections::HashMap,
    future::Future,
    pin::Pin,
    sync::{Arc, PoisonError, RwLock},
};

pub type BoxedObjectCacheFuture =
    Pin<Box<dyn Future<Output = Result<Box<dyn ObjectCache>>> + Send>>;
pub type ObjectCacheConstructor = Arc<dyn Fn() -> BoxedObjectCacheFuture + Send + Sync>;

static PLUGINS: Lazy<RwLock<HashMap<String, ObjectCacheConstructor>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

pub fn register_object_cache_plugin<S: Into<String>>(name: S, constructor: ObjectCacheConstructor) {
    PLUGINS
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(name.into(), constructor);
}

pub fn get_object_cache_plugin(name: &str) -> Option<ObjectCacheConstructor> {
    PLUGINS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(name)
        .cloned()
}

/// 已注册的插件名（排序后）
pub fn registered_object_cache_plugins() -> Vec<String> {
    let mut names: Vec<String> = PLUGINS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .keys()
        .cloned()
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_plugins_registered() {
        let names = registered_object_cache_plugins();
        assert!(names.contains(&"moka".to_string()));
        assert!(names.contains(&"redis".to_string()));
        assert!(get_object_cache_plugin("memcached").is_none());
    }
}
