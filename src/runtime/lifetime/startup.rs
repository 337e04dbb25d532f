use crate::cache::{ObjectCache, register::get_object_cache_plugin};
use crate::config::AppConfig;
use crate::models::users::entities::UserRole;
use crate::models::users::requests::CreateUserRequest;
use crate::storage::Storage;
use crate::utils::password::hash_password;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
}

/// 按名称构造缓存后端
async fn build_cache(name: &str) -> Result<Arc<dyn ObjectCache>, String> {
    let constructor = get_object_cache_plugin(name)
        .ok_or_else(|| format!("cache backend '{name}' not registered"))?;
    let cache = constructor().await.map_err(|e| e.to_string())?;
    Ok(Arc::from(cache))
}

/// 创建缓存实例，配置的后端不可用时回退到 moka
async fn create_cache() -> Result<Arc<dyn ObjectCache>, String> {
    let cache_type = AppConfig::get().cache.cache_type.as_str();
    warn!("Attempting to create {} cache backend", cache_type);

    match build_cache(cache_type).await {
        Ok(cache) => {
            warn!("Using {} cache backend", cache_type);
            Ok(cache)
        }
        Err(e) if cache_type != "moka" => {
            warn!("{}, falling back to in-memory moka cache", e);
            build_cache("moka").await
        }
        Err(e) => Err(e),
    }
}

/// 生成随机密码
fn generate_random_password(length: usize) -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%";
    let mut rng = rand::rng();
    (0..length)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// 默认管理员邮箱
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@localhost";

/// 首次启动时创建默认管理员
/// 已存在任一管理员时跳过
async fn seed_admin(storage: &Arc<dyn Storage>) {
    match storage.count_users_by_role(UserRole::Admin).await {
        Ok(count) if count > 0 => {
            debug!("Found {} admin account(s), skipping admin seed", count);
            return;
        }
        Ok(_) => {
            info!("No admin account found, creating {}", DEFAULT_ADMIN_EMAIL);
        }
        Err(e) => {
            warn!("Failed to count admin accounts: {}, skipping admin seed", e);
            return;
        }
    }

    // 优先使用环境变量中的密码
    let password = match std::env::var("ADMIN_PASSWORD") {
        Ok(password) if !password.trim().is_empty() => password,
        _ => {
            let generated = generate_random_password(16);
            warn!("==========================================================");
            warn!("  ADMIN_PASSWORD not set, generated a password for");
            warn!("  {}: {}", DEFAULT_ADMIN_EMAIL, generated);
            warn!("==========================================================");
            generated
        }
    };

    let password_hash = match hash_password(&password) {
        Ok(hash) => hash,
        Err(e) => {
            warn!("Failed to hash admin password: {}, skipping admin seed", e);
            return;
        }
    };

    let admin_request = CreateUserRequest {
        email: DEFAULT_ADMIN_EMAIL.to_string(),
        password: password_hash,
        display_name: "Administrator".to_string(),
        role: UserRole::Admin,
        program_id: None,
    };

    match storage.create_user(admin_request).await {
        Ok(user) => info!("Default admin account created (ID: {})", user.id),
        Err(e) => warn!("Failed to create admin account: {}", e),
    }
}

/// 准备服务器启动的上下文
/// 初始化存储并执行迁移，创建缓存后端
pub async fn prepare_server_startup() -> StartupContext {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    if cfg!(debug_assertions) {
        crate::cache::register::debug_object_cache_registry();
        debug!("Debug mode: Cache registry is enabled");
    }

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    // 首次启动创建管理员
    seed_admin(&storage).await;

    // 创建缓存实例
    let cache = create_cache().await.expect("Failed to create cache");
    warn!("Cache backend initialized");

    StartupContext { storage, cache }
}
