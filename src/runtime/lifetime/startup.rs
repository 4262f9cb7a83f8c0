use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::models::classes::requests::ScheduleOptions;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::storage::Storage;
use crate::utils::password::{generate_password, hash_password};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

/// 按名称创建缓存后端
async fn try_cache_backend(name: &str) -> Option<Arc<dyn ObjectCache>> {
    let Some(constructor) = get_object_cache_plugin(name) else {
        warn!("Cache backend '{}' not found in registry", name);
        return None;
    };
    match constructor().await {
        Ok(cache) => {
            warn!("Successfully created {} cache backend", name);
            Some(Arc::from(cache))
        }
        Err(e) => {
            warn!("Failed to create {} cache: {}", name, e);
            None
        }
    }
}

/// 创建缓存实例，配置的后端不可用时回退到 Moka
async fn create_cache() -> Result<Arc<dyn ObjectCache>, Box<dyn std::error::Error>> {
    let cache_type = &AppConfig::get().cache.cache_type;
    warn!("Attempting to create {} cache backend", cache_type);

    if let Some(cache) = try_cache_backend(cache_type).await {
        return Ok(cache);
    }
    if cache_type != "moka" {
        warn!("Falling back to memory cache");
        if let Some(cache) = try_cache_backend("moka").await {
            return Ok(cache);
        }
    }

    Err(format!("No cache backend available (tried: {cache_type})").into())
}

/// 初始化默认管理员账号
/// 如果数据库中没有管理员，则创建一个默认的 admin 账号
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_admins().await {
        Ok(count) if count > 0 => {
            debug!(
                "Database already has {} admin(s), skipping admin seed",
                count
            );
            return;
        }
        Ok(_) => {
            info!("No admin found in database, creating default admin account...");
        }
        Err(e) => {
            warn!("Failed to count admins: {}, skipping admin seed", e);
            return;
        }
    }

    // 获取密码：优先从环境变量，否则生成随机密码
    let password = std::env::var("ADMIN_PASSWORD").unwrap_or_else(|_| {
        let pwd = generate_password(16);
        warn!("==========================================================");
        warn!("  ADMIN PASSWORD NOT SET - USING GENERATED PASSWORD");
        warn!("  Generated admin password: {}", pwd);
        warn!("  Please save this password or set ADMIN_PASSWORD env var");
        warn!("==========================================================");
        pwd
    });

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    let admin_request = CreateUserRequest {
        username: "admin".to_string(),
        password: password_hash,
        full_name: "Administrator".to_string(),
        email: "admin@localhost.local".to_string(),
        phone: None,
        birth_date: None,
        role: UserRole::Admin,
        class_ids: Vec::new(),
    };

    match storage.create_user(admin_request).await {
        Ok(user) => {
            info!(
                "Default admin account created successfully (ID: {}, username: {})",
                user.id, user.username
            );
        }
        Err(e) => {
            warn!("Failed to create admin account: {}", e);
        }
    }
}

/// 启动时清理一次过期补课时段
async fn prune_makeups(storage: &Arc<dyn Storage>) {
    let options = ScheduleOptions::from_config(&AppConfig::get().schedule);
    match storage
        .prune_expired_makeups(chrono::Utc::now(), options.makeup_ttl)
        .await
    {
        Ok(0) => debug!("No expired makeup slots"),
        Ok(changed) => info!("Pruned expired makeup slots in {} classes", changed),
        Err(e) => warn!("Failed to prune expired makeup slots: {}", e),
    }
}

/// 准备服务器启动的上下文
/// 包括存储、缓存和默认数据
pub async fn prepare_server_startup() -> Result<StartupContext, Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| "Failed to install rustls crypto provider")?;

    if cfg!(debug_assertions) {
        debug!(
            "Registered object cache plugins: {:?}",
            crate::cache::register::registered_object_cache_plugins()
        );
    }

    let storage = crate::storage::create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    // 初始化默认管理员账号（如果需要）
    seed_admin(&storage).await;
    prune_makeups(&storage).await;

    let cache = create_cache().await?;
    warn!("Cache backend initialized");

    Ok(StartupContext { storage, cache })
}
