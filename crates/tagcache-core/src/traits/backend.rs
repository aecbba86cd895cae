//! Storage backend trait

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// Core trait for all cache storage backends
///
/// Values are opaque bytes. A `ttl` of `None` or zero means the entry never
/// expires. Every method is cancelled by dropping its future; wrap calls in
/// `tokio::time::timeout` to bound them.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Get the bytes stored under `key`
    ///
    /// Fails with [`CacheError::NotFound`](crate::CacheError::NotFound) if the
    /// key doesn't exist or has expired.
    async fn get(&self, key: &str) -> Result<Vec<u8>>;

    /// Store or overwrite `key`
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()>;

    /// Delete a key. Deleting an absent key succeeds.
    async fn del(&self, key: &str) -> Result<()>;

    /// Delete every entry owned by this backend
    async fn del_all(&self) -> Result<()>;

    /// Release connections and background tasks held by the backend
    ///
    /// Call once at shutdown. Implementations tolerate repeated calls.
    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<B> Backend for Arc<B>
where
    B: Backend + ?Sized,
{
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        (**self).get(key).await
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        (**self).set(key, value, ttl).await
    }

    async fn del(&self, key: &str) -> Result<()> {
        (**self).del(key).await
    }

    async fn del_all(&self) -> Result<()> {
        (**self).del_all().await
    }

    async fn close(&self) -> Result<()> {
        (**self).close().await
    }
}

/// Whether `ttl` asks for an entry that expires
pub fn expires(ttl: Option<Duration>) -> Option<Duration> {
    ttl.filter(|ttl| !ttl.is_zero())
}
