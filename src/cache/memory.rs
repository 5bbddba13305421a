//! In-memory cache implementation using moka
//!
//! Provides a fast, thread-safe in-memory cache with TTL support.
//!
//! Every entry expires after the configured TTL.

use super::CacheLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default maximum cache capacity (number of entries)
const DEFAULT_MAX_CAPACITY: u64 = 1_000;

/// Default TTL for cache entries (5 minutes)
const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Cache entry wrapper that stores serialized JSON data
/// so any serializable response type can share one cache
#[derive(Clone)]
struct CacheEntry {
    data: Arc<String>,
}

impl CacheEntry {
    fn new<T: Serialize>(value: &T) -> Result<Self> {
        let json = serde_json::to_string(value)
            .context("Failed to serialize cache value")?;
        Ok(Self {
            data: Arc::new(json),
        })
    }

    fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.data)
            .context("Failed to deserialize cache value")
    }
}

/// In-memory cache using moka
///
/// Values are stored as JSON strings to support generic types.
pub struct MemoryCache {
    cache: Cache<String, CacheEntry>,
    ttl: Duration,
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entry_count", &self.cache.entry_count())
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl MemoryCache {
    /// Create a new memory cache with default settings
    ///
    /// Default configuration:
    /// - Max capacity: 1,000 entries
    /// - TTL: 5 minutes
    pub fn new() -> Self {
        Self::with_capacity_and_ttl(DEFAULT_MAX_CAPACITY, DEFAULT_TTL)
    }

    /// Create a new memory cache with custom capacity and TTL
    pub fn with_capacity_and_ttl(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();

        Self { cache, ttl }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheLayer for MemoryCache {
    /// Returns `Ok(None)` if the key doesn't exist or has expired.
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.cache.get(key).await {
            Some(entry) => Ok(Some(entry.deserialize()?)),
            None => Ok(None),
        }
    }

    /// Overwrites any existing value; the entry expires after the cache TTL.
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let entry = CacheEntry::new(value)?;
        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
        Ok(())
    }
}
