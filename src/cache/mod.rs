//! Request cache
//!
//! Key-based cache of server responses, the client-side copy of courses,
//! modules, lessons and the student roster. Entries are never refreshed in
//! the background: services update them explicitly after a mutation
//! succeeds (insert/replace/remove) or after a local reorder, and invalidate
//! them when the copy can no longer be trusted.
//!
//! # Usage
//!
//! ```rust,ignore
//! use coursedesk::cache::{create_cache, QueryKey};
//! use coursedesk::config::CacheConfig;
//!
//! let cache = create_cache(&CacheConfig::default());
//! cache.set(&QueryKey::Courses, &courses).await?;
//! cache.replace(&QueryKey::Courses, updated_course).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;
use crate::models::Ordered;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// Has generic methods, so it is used as a bound rather than a trait object.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

/// Identifies one cached server query
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    /// The creator's own courses, in display order
    Courses,
    /// One course by id
    Course(i64),
    /// Modules of a course
    Modules(i64),
    /// Lessons of a module
    Lessons(i64),
    /// Student roster
    Students,
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Courses => write!(f, "courses"),
            Self::Course(id) => write!(f, "course:{}", id),
            Self::Modules(course_id) => write!(f, "modules:{}", course_id),
            Self::Lessons(module_id) => write!(f, "lessons:{}", module_id),
            Self::Students => write!(f, "students"),
        }
    }
}

/// Typed query cache with explicit collection patches
pub struct QueryCache<C: CacheLayer = MemoryCache> {
    inner: C,
}

impl<C: CacheLayer> fmt::Debug for QueryCache<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCache").finish_non_exhaustive()
    }
}

impl<C: CacheLayer> QueryCache<C> {
    pub fn new(inner: C) -> Self {
        Self { inner }
    }

    pub async fn get<T: DeserializeOwned + Send>(&self, key: &QueryKey) -> Result<Option<T>> {
        self.inner.get(&key.to_string()).await
    }

    pub async fn set<T: Serialize + Send + Sync>(&self, key: &QueryKey, value: &T) -> Result<()> {
        self.inner.set(&key.to_string(), value).await
    }

    pub async fn invalidate(&self, key: &QueryKey) -> Result<()> {
        self.inner.delete(&key.to_string()).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }

    /// Append a newly created item to a cached list.
    ///
    /// A list that was never fetched stays absent; the next read loads it
    /// from the server with the new item included.
    pub async fn insert<T>(&self, key: &QueryKey, item: T) -> Result<()>
    where
        T: Ordered + Serialize + DeserializeOwned + Send + Sync,
    {
        if let Some(mut list) = self.get::<Vec<T>>(key).await? {
            list.push(item);
            self.set(key, &list).await?;
        }
        Ok(())
    }

    /// Replace the cached entry with the same id as `item`
    pub async fn replace<T>(&self, key: &QueryKey, item: T) -> Result<()>
    where
        T: Ordered + Serialize + DeserializeOwned + Send + Sync,
    {
        if let Some(mut list) = self.get::<Vec<T>>(key).await? {
            if let Some(slot) = list.iter_mut().find(|existing| existing.id() == item.id()) {
                *slot = item;
                self.set(key, &list).await?;
            }
        }
        Ok(())
    }

    /// Remove the cached entry with the given id
    pub async fn remove<T>(&self, key: &QueryKey, id: i64) -> Result<()>
    where
        T: Ordered + Serialize + DeserializeOwned + Send + Sync,
    {
        if let Some(mut list) = self.get::<Vec<T>>(key).await? {
            list.retain(|existing| existing.id() != id);
            self.set(key, &list).await?;
        }
        Ok(())
    }
}

/// Create the request cache from configuration
pub fn create_cache(config: &CacheConfig) -> Arc<QueryCache> {
    let ttl = Duration::from_secs(config.ttl_seconds);
    Arc::new(QueryCache::new(MemoryCache::with_capacity_and_ttl(config.max_capacity, ttl)))
}
