use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tracing::{debug, warn};

use crate::cache::{CacheResult, ObjectCache};
use crate::config::AppConfig;
use crate::declare_object_cache_plugin;

declare_object_cache_plugin!("moka", MokaCacheWrapper);

#[derive(Clone)]
struct CachedValue {
    value: String,
    ttl: Duration,
}

/// 每个条目按写入时给定的 TTL 过期
struct PerEntryTtl;

impl Expiry<String, CachedValue> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &CachedValue,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &CachedValue,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

pub struct MokaCacheWrapper {
    inner: Cache<String, CachedValue>,
    default_ttl: Duration,
}

impl MokaCacheWrapper {
    pub fn new() -> Result<Self, String> {
        let config = AppConfig::get();
        Ok(Self::with_settings(
            config.cache.memory.max_capacity,
            config.cache.default_ttl,
        ))
    }

    pub fn with_settings(max_capacity: u64, ttl_secs: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(PerEntryTtl)
            .support_invalidation_closures()
            .build();

        debug!(
            "MokaCacheWrapper initialized with max capacity: {}, TTL: {}s",
            max_capacity, ttl_secs
        );
        Self {
            inner,
            default_ttl: Duration::from_secs(ttl_secs),
        }
    }
}

#[async_trait]
impl ObjectCache for MokaCacheWrapper {
    async fn get_raw(&self, key: &str) -> CacheResult<String> {
        match self.inner.get(key).await {
            Some(entry) => CacheResult::Found(entry.value),
            None => {
                debug!("Key not found in cache: {}", key);
                CacheResult::NotFound
            }
        }
    }

    async fn insert_raw(&self, key: String, value: String, ttl: u64) {
        let ttl = if ttl == 0 {
            self.default_ttl
        } else {
            Duration::from_secs(ttl)
        };
        self.inner.insert(key, CachedValue { value, ttl }).await;
    }

    async fn remove(&self, key: &str) {
        self.inner.invalidate(key).await;
    }

    async fn invalidate_prefix(&self, prefix: &str) {
        let prefix = prefix.to_string();
        if let Err(e) = self
            .inner
            .invalidate_entries_if(move |key, _| key.starts_with(&prefix))
        {
            warn!("Failed to invalidate cache entries by prefix: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[actix_web::test]
    async fn test_insert_get_remove() {
        let cache = MokaCacheWrapper::with_settings(100, 60);
        cache
            .insert_raw("user:abc".to_string(), "{}".to_string(), 0)
            .await;
        assert_eq!(
            cache.get_raw("user:abc").await,
            CacheResult::Found("{}".to_string())
        );

        cache.remove("user:abc").await;
        assert_eq!(cache.get_raw("user:abc").await, CacheResult::NotFound);
    }

    #[actix_web::test]
    async fn test_entry_ttl_overrides_default() {
        let cache = MokaCacheWrapper::with_settings(100, 60);
        cache
            .insert_raw("revoked:short".to_string(), "1".to_string(), 1)
            .await;
        cache
            .insert_raw("revoked:long".to_string(), "1".to_string(), 0)
            .await;

        actix_web::rt::time::sleep(Duration::from_millis(1200)).await;
        cache.inner.run_pending_tasks().await;

        assert_eq!(cache.get_raw("revoked:short").await, CacheResult::NotFound);
        assert_eq!(
            cache.get_raw("revoked:long").await,
            CacheResult::Found("1".to_string())
        );
    }

    #[actix_web::test]
    async fn test_invalidate_prefix_keeps_other_keys() {
        let cache = MokaCacheWrapper::with_settings(100, 60);
        for key in ["user:a", "user:b", "revoked:a"] {
            cache.insert_raw(key.to_string(), "v".to_string(), 0).await;
        }

        cache.invalidate_prefix("user:").await;
        cache.inner.run_pending_tasks().await;

        assert_eq!(cache.get_raw("user:a").await, CacheResult::NotFound);
        assert_eq!(cache.get_raw("user:b").await, CacheResult::NotFound);
        assert_eq!(
            cache.get_raw("revoked:a").await,
            CacheResult::Found("v".to_string())
        );
    }
}
