//! Cache layer
//!
//! Hot read paths (property and blog detail pages, the category list) are
//! cached in-process. Writes invalidate the affected keys through the
//! helpers in [`keys`].
//!
//! ```rust,ignore
//! use hay_property::cache::{create_cache, CacheLayer};
//!
//! let cache = create_cache(&config.cache);
//! cache.set(&keys::property_slug("ocean-view"), &property, cache.default_ttl()).await?;
//! ```

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::config::CacheConfig;

pub use memory::MemoryCache;

/// Cache layer trait
///
/// The methods are generic over the stored type, so this trait is used
/// through concrete types rather than `dyn CacheLayer`.
#[async_trait]
pub trait CacheLayer: Send + Sync {
    /// Get a value from cache
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>>;

    /// Set a value in cache with TTL
    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T, ttl: Duration) -> Result<()>;

    /// Delete a value from cache
    async fn delete(&self, key: &str) -> Result<()>;

    /// Delete all values matching a glob pattern
    async fn delete_pattern(&self, pattern: &str) -> Result<()>;

    /// Clear all cache entries
    async fn clear(&self) -> Result<()>;
}

/// Shared cache handle held by services
pub type SharedCache = Arc<MemoryCache>;

/// Build the cache from configuration
pub fn create_cache(config: &CacheConfig) -> SharedCache {
    tracing::debug!(
        max_capacity = config.max_capacity,
        ttl_seconds = config.ttl_seconds,
        "Creating in-memory cache"
    );
    Arc::new(MemoryCache::with_capacity_and_ttl(
        config.max_capacity,
        Duration::from_secs(config.ttl_seconds),
    ))
}

/// Cache key builders
pub mod keys {
    pub const PROPERTY_SLUG_PATTERN: &str = "property:slug:*";
    pub const BLOG_SLUG_PATTERN: &str = "blog:slug:*";
    pub const BLOG_CATEGORIES: &str = "blog:categories";

    pub fn property_slug(slug: &str) -> String {
        format!("property:slug:{}", slug)
    }

    pub fn blog_slug(slug: &str) -> String {
        format!("blog:slug:{}", slug)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_cache_uses_config_ttl() {
        let cache = create_cache(&CacheConfig {
            ttl_seconds: 42,
            max_capacity: 10,
        });
        assert_eq!(cache.default_ttl(), Duration::from_secs(42));

        cache
            .set(&keys::property_slug("villa"), &"cached", cache.default_ttl())
            .await
            .unwrap();
        cache.delete_pattern(keys::PROPERTY_SLUG_PATTERN).await.unwrap();
        assert!(cache
            .get::<String>(&keys::property_slug("villa"))
            .await
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_keys() {
        assert_eq!(keys::property_slug("a-b"), "property:slug:a-b");
        assert_eq!(keys::blog_slug("post"), "blog:slug:post");
    }
}
