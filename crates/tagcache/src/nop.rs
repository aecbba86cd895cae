//! Cache that stores nothing

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use tagcache_core::{Cache, CacheError, Result};

/// A [`Cache`] that accepts every write and misses every read.
///
/// Useful to switch caching off without changing call sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopCache;

#[async_trait]
impl Cache for NopCache {
    async fn set<T>(&self, _key: &str, _value: &T, _tags: &[&str]) -> Result<()>
    where
        T: Serialize + Sync,
    {
        Ok(())
    }

    async fn get<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        Err(CacheError::absent(key))
    }

    async fn del_by_key(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn del_by_tag(&self, _tag: &str) -> Result<()> {
        Ok(())
    }

    async fn del_all(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagcache_core::MissReason;

    #[tokio::test]
    async fn test_nop_always_misses() {
        let cache = NopCache;

        cache.set("key", &42i32, &["tag"]).await.unwrap();
        let err = cache.get::<i32>("key").await.unwrap_err();
        assert_eq!(err.miss_reason(), Some(MissReason::Absent));

        cache.del_by_key("key").await.unwrap();
        cache.del_by_tag("tag").await.unwrap();
        cache.del_all().await.unwrap();
    }
}
