//! In-process cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::time::Instant;

use super::CacheService;
use crate::error::{Error, Result};

struct Entry {
    value: Value,
    tags: Vec<String>,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Tagged in-memory cache with per-entry expiry.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .map(|entries| entries.values().filter(|e| !e.is_expired(now)).count())
            .unwrap_or(0)
    }

    /// Whether no live entry exists.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>> {
        self.entries
            .lock()
            .map_err(|_| Error::cache("memory cache lock poisoned"))
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        if entries.get(key).is_some_and(|e| e.is_expired(now)) {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|e| e.value.clone()))
    }

    async fn save(
        &self,
        key: &str,
        value: Value,
        tags: &[String],
        lifetime: Option<Duration>,
    ) -> Result<()> {
        let entry = Entry {
            value,
            tags: tags.to_vec(),
            expires_at: lifetime.map(|l| Instant::now() + l),
        };
        self.lock()?.insert(key.to_string(), entry);
        Ok(())
    }

    async fn clean_tags(&self, tags: &[String]) -> Result<usize> {
        let mut entries = self.lock()?;
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.iter().any(|t| tags.contains(t)));
        let removed = before - entries.len();
        log::debug!("Cleaned {removed} cache entries for tags {tags:?}");
        Ok(removed)
    }

    async fn clean_all(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_load_miss() {
        let cache = MemoryCache::new();
        assert!(cache.load("missing").await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let cache = MemoryCache::new();
        cache
            .save("k", json!({"a": 1}), &tags(&["config"]), None)
            .await
            .unwrap();
        assert_eq!(cache.load("k").await.unwrap(), Some(json!({"a": 1})));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_overwrite_is_idempotent() {
        let cache = MemoryCache::new();
        for _ in 0..2 {
            cache
                .save("k", json!(42), &tags(&["MAXPRICE"]), None)
                .await
                .unwrap();
        }
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.load("k").await.unwrap(), Some(json!(42)));
    }

    #[tokio::test]
    async fn test_clean_tags_removes_only_tagged_entries() {
        let cache = MemoryCache::new();
        cache
            .save("color", json!([]), &tags(&["EAV_ATTRIBUTE:1", "SEARCH_INDEX"]), None)
            .await
            .unwrap();
        cache
            .save("size", json!([]), &tags(&["EAV_ATTRIBUTE:2"]), None)
            .await
            .unwrap();
        cache
            .save("schema", json!({}), &tags(&["config"]), None)
            .await
            .unwrap();

        let removed = cache.clean_tags(&tags(&["EAV_ATTRIBUTE:1"])).await.unwrap();
        assert_eq!(removed, 1);
        assert!(cache.load("color").await.unwrap().is_none());
        assert!(cache.load("size").await.unwrap().is_some());

        cache.clean_all().await.unwrap();
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let cache = MemoryCache::new();
        cache
            .save("k", json!(1), &[], Some(Duration::from_secs(60)))
            .await
            .unwrap();
        assert!(cache.load("k").await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.load("k").await.unwrap().is_none());
    }
}
