//! In-memory provider using the moka crate.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tokio::sync::{Mutex, Notify};
use tracing::debug;

use snippet_core::config::cache::MemoryCacheConfig;
use snippet_core::result::AppResult;
use snippet_core::traits::cache::CacheProvider;

/// A cached value with the TTL it was written with.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after its own TTL; a write resets the clock.
struct PerEntryTtl;

impl Expiry<String, Entry> for PerEntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory provider: moka for key/values, mutex-guarded deques for lists.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    /// Key/value entries with per-entry expiry.
    cache: Cache<String, Entry>,
    /// Lists, head at the front.
    lists: Arc<Mutex<HashMap<String, VecDeque<String>>>>,
    /// Wakes blocked poppers after a push.
    pushed: Arc<Notify>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory provider from configuration.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self {
            cache,
            lists: Arc::new(Mutex::new(HashMap::new())),
            pushed: Arc::new(Notify::new()),
        }
    }

    async fn try_pop(&self, key: &str) -> Option<String> {
        let mut lists = self.lists.lock().await;
        let list = lists.get_mut(key)?;
        let value = list.pop_back();
        if list.is_empty() {
            lists.remove(key);
        }
        value
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        if ttl.is_zero() {
            self.cache.remove(key).await;
            return Ok(());
        }
        let entry = Entry {
            value: value.to_string(),
            ttl,
        };
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        self.lists.lock().await.remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        if self.cache.contains_key(key) {
            return Ok(true);
        }
        Ok(self.lists.lock().await.contains_key(key))
    }

    async fn push_list(&self, key: &str, value: &str) -> AppResult<u64> {
        let len = {
            let mut lists = self.lists.lock().await;
            let list = lists.entry(key.to_string()).or_default();
            list.push_front(value.to_string());
            list.len() as u64
        };
        self.pushed.notify_waiters();
        debug!(key, len, "Pushed list value");
        Ok(len)
    }

    async fn pop_list_blocking(&self, key: &str, timeout: Duration) -> AppResult<Option<String>> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // Register interest before checking so a push in between is not missed.
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(value) = self.try_pop(key).await {
                return Ok(Some(value));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn list_len(&self, key: &str) -> AppResult<u64> {
        let lists = self.lists.lock().await;
        Ok(lists.get(key).map_or(0, |list| list.len() as u64))
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}
