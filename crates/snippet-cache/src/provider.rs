//! Cache manager that dispatches to the configured provider.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use snippet_core::config::cache::CacheConfig;
use snippet_core::error::AppError;
use snippet_core::result::AppResult;
use snippet_core::traits::cache::CacheProvider;

/// Cache manager that wraps the configured cache provider.
///
/// The provider is selected at construction time based on configuration.
#[derive(Debug, Clone)]
pub struct CacheManager {
    /// The inner cache provider.
    inner: Arc<dyn CacheProvider>,
}

impl CacheManager {
    /// Create a new cache manager from configuration.
    pub async fn new(config: &CacheConfig) -> AppResult<Self> {
        let inner: Arc<dyn CacheProvider> = match config.provider.as_str() {
            #[cfg(feature = "redis-backend")]
            "redis" => {
                info!("Initializing Redis cache provider");
                let client = crate::redis::RedisClient::connect(&config.redis).await?;
                Arc::new(crate::redis::RedisCacheProvider::new(client))
            }
            #[cfg(feature = "memory")]
            "memory" => {
                info!("Initializing in-memory cache provider");
                Arc::new(crate::memory::MemoryCacheProvider::new(&config.memory))
            }
            other => {
                return Err(AppError::configuration(format!(
                    "Unknown cache provider: '{other}'. Supported: memory, redis"
                )));
            }
        };

        Ok(Self { inner })
    }

    /// Manager for a consumer that issues blocking pops.
    ///
    /// Redis runs a connection's commands in order, so a `BRPOP` parked on
    /// the shared connection would hold up every other caller. The redis
    /// provider therefore gets its own connection. The memory provider keeps
    /// its lists in-process and is shared as is.
    pub async fn dedicated(&self, config: &CacheConfig) -> AppResult<Self> {
        match config.provider.as_str() {
            "redis" => {
                info!("Opening dedicated cache connection for blocking consumer");
                Self::new(config).await
            }
            _ => Ok(self.clone()),
        }
    }

    /// Create a cache manager from an existing provider (for testing).
    pub fn from_provider(provider: Arc<dyn CacheProvider>) -> Self {
        Self { inner: provider }
    }

    /// In-memory manager with default settings.
    #[cfg(feature = "memory")]
    pub fn in_memory() -> Self {
        Self::from_provider(Arc::new(crate::memory::MemoryCacheProvider::new(
            &Default::default(),
        )))
    }
}

#[async_trait]
impl CacheProvider for CacheManager {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.inner.set(key, value, ttl).await
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.inner.delete(key).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        self.inner.exists(key).await
    }

    async fn push_list(&self, key: &str, value: &str) -> AppResult<u64> {
        self.inner.push_list(key, value).await
    }

    async fn pop_list_blocking(&self, key: &str, timeout: Duration) -> AppResult<Option<String>> {
        self.inner.pop_list_blocking(key, timeout).await
    }

    async fn list_len(&self, key: &str) -> AppResult<u64> {
        self.inner.list_len(key).await
    }

    async fn health_check(&self) -> AppResult<bool> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_provider_is_rejected() {
        let config = CacheConfig {
            provider: "layered".to_string(),
            ..Default::default()
        };
        let err = CacheManager::new(&config).await.unwrap_err();
        assert_eq!(err.kind, snippet_core::error::ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn dedicated_memory_manager_shares_lists() {
        let config = CacheConfig::default();
        let shared = CacheManager::new(&config).await.unwrap();
        let consumer = shared.dedicated(&config).await.unwrap();

        shared.push_list("queue", "job-1").await.unwrap();
        let popped = consumer
            .pop_list_blocking("queue", Duration::from_millis(100))
            .await
            .unwrap();
        assert_eq!(popped.as_deref(), Some("job-1"));
        assert_eq!(shared.list_len("queue").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn memory_provider_round_trips_json() {
        let cache = CacheManager::new(&CacheConfig::default()).await.unwrap();
        let data = serde_json::json!({"status": "PENDING", "timestamp": 1});
        cache
            .set_json("status", &data, Duration::from_secs(60))
            .await
            .unwrap();
        let read: Option<serde_json::Value> = cache.get_json("status").await.unwrap();
        assert_eq!(read, Some(data));
    }
}
