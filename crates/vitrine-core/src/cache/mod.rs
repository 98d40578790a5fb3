//! Cache service abstraction.
//!
//! All caching in Vitrine (index schema, facet item lists, maximum prices)
//! goes through [`CacheService`]. Entries carry tags so that a whole family of
//! entries can be invalidated at once, e.g. every facet list of an attribute
//! after the attribute is edited, or everything after a reindex.
//!
//! Writes are idempotent: two requests that miss the same key at the same time
//! both recompute and overwrite with the same payload and tags.
//!
//! # Backends
//!
//! - [`MemoryCache`]: in-process store, used by tests and the CLI
//! - `RedisCache`: shared store (requires the `cache-redis` feature)

pub mod memory;

#[cfg(feature = "cache-redis")]
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Result;

pub use memory::MemoryCache;

#[cfg(feature = "cache-redis")]
pub use self::redis::RedisCache;

/// Well-known cache tags.
pub mod tags {
    /// Configuration-derived data, such as the index schema.
    pub const CONFIG: &str = "config";

    /// Maximum price statistics.
    pub const MAXPRICE: &str = "MAXPRICE";

    /// Anything derived from indexed documents.
    pub const SEARCH_INDEX: &str = "SEARCH_INDEX";

    /// Tag of everything derived from one attribute.
    pub fn attribute(id: u32) -> String {
        format!("EAV_ATTRIBUTE:{id}")
    }

    /// Tag of everything derived from one category.
    pub fn category(id: u64) -> String {
        format!("CATALOG_CATEGORY:{id}")
    }
}

/// Tagged key/value cache.
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Load a value. `Ok(None)` is a miss.
    async fn load(&self, key: &str) -> Result<Option<Value>>;

    /// Store a value under `key` with the given tags.
    ///
    /// `lifetime = None` keeps the entry until it is invalidated.
    async fn save(
        &self,
        key: &str,
        value: Value,
        tags: &[String],
        lifetime: Option<Duration>,
    ) -> Result<()>;

    /// Remove every entry carrying at least one of `tags`.
    ///
    /// Returns the number of removed entries.
    async fn clean_tags(&self, tags: &[String]) -> Result<usize>;

    /// Remove everything.
    async fn clean_all(&self) -> Result<()>;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;
}

/// Load and deserialize a cached value.
///
/// Cache failures and undecodable payloads are treated as misses: callers
/// recompute, they never fail because of the cache.
pub async fn load_as<T: DeserializeOwned>(cache: &dyn CacheService, key: &str) -> Option<T> {
    match cache.load(key).await {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                log::warn!("Discarding undecodable cache entry '{key}': {e}");
                None
            }
        },
        Ok(None) => None,
        Err(e) => {
            log::warn!("Cache load failed for '{key}' ({}): {e}", cache.name());
            None
        }
    }
}

/// Serialize and store a value, logging (not returning) failures.
pub async fn save_as<T: Serialize + ?Sized>(
    cache: &dyn CacheService,
    key: &str,
    value: &T,
    tags: &[String],
    lifetime: Option<Duration>,
) {
    let payload = match serde_json::to_value(value) {
        Ok(payload) => payload,
        Err(e) => {
            log::warn!("Cannot serialize cache entry '{key}': {e}");
            return;
        }
    };
    if let Err(e) = cache.save(key, payload, tags, lifetime).await {
        log::warn!("Cache save failed for '{key}' ({}): {e}", cache.name());
    }
}

// ============================================================================
// Tests
// ============================================================================
