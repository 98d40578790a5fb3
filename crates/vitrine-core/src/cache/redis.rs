//! Redis-backed cache.
//!
//! Entries are stored as JSON strings under `<prefix><key>`. Each tag is a
//! Redis set (`<prefix>tag:<tag>`) listing the keys that carry it, so
//! invalidating a tag deletes every member and then the set itself.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use serde_json::Value;

use super::CacheService;
use crate::error::{Error, Result};

/// Default key prefix.
pub const DEFAULT_PREFIX: &str = "vitrine:";

/// Cache stored in a shared Redis instance.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisCache {
    /// Connect to Redis at `url` (e.g. `redis://127.0.0.1/`).
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_prefix(url, DEFAULT_PREFIX).await
    }

    /// Connect with a custom key prefix.
    pub async fn connect_with_prefix(url: &str, prefix: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url).map_err(|e| Error::cache(e.to_string()))?;
        let conn = ConnectionManager::new(client)
            .await
            .map_err(|e| Error::cache(format!("Cannot connect to redis at {url}: {e}")))?;
        log::info!("Connected to redis cache at {url}");
        Ok(Self {
            conn,
            prefix: prefix.into(),
        })
    }

    fn entry_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    fn tag_key(&self, tag: &str) -> String {
        format!("{}tag:{tag}", self.prefix)
    }
}

fn redis_err(e: redis::RedisError) -> Error {
    Error::cache(e.to_string())
}

#[async_trait]
impl CacheService for RedisCache {
    async fn load(&self, key: &str) -> Result<Option<Value>> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn.get(self.entry_key(key)).await.map_err(redis_err)?;
        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        key: &str,
        value: Value,
        tags: &[String],
        lifetime: Option<Duration>,
    ) -> Result<()> {
        let mut conn = self.conn.clone();
        let entry_key = self.entry_key(key);
        let payload = serde_json::to_string(&value)?;

        match lifetime {
            Some(lifetime) => conn
                .set_ex::<_, _, ()>(&entry_key, payload, lifetime.as_secs().max(1))
                .await
                .map_err(redis_err)?,
            None => conn
                .set::<_, _, ()>(&entry_key, payload)
                .await
                .map_err(redis_err)?,
        }

        for tag in tags {
            conn.sadd::<_, _, ()>(self.tag_key(tag), &entry_key)
                .await
                .map_err(redis_err)?;
        }
        Ok(())
    }

    async fn clean_tags(&self, tags: &[String]) -> Result<usize> {
        let mut conn = self.conn.clone();
        let mut removed = 0;
        for tag in tags {
            let tag_key = self.tag_key(tag);
            let members: Vec<String> = conn.smembers(&tag_key).await.map_err(redis_err)?;
            if !members.is_empty() {
                removed += conn.del::<_, usize>(&members).await.map_err(redis_err)?;
            }
            conn.del::<_, ()>(&tag_key).await.map_err(redis_err)?;
        }
        log::debug!("Cleaned {removed} redis cache entries for tags {tags:?}");
        Ok(removed)
    }

    async fn clean_all(&self) -> Result<()> {
        let mut conn = self.conn.clone();
        let keys: Vec<String> = conn
            .keys(format!("{}*", self.prefix))
            .await
            .map_err(redis_err)?;
        if !keys.is_empty() {
            conn.del::<_, ()>(&keys).await.map_err(redis_err)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "redis"
    }
}

impl std::fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisCache")
            .field("prefix", &self.prefix)
            .finish()
    }
}
