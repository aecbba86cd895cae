use async_trait::async_trait;
use bb8::{Pool, PooledConnection, RunError};
use bb8_redis::RedisConnectionManager;
use redis::AsyncCommands;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::debug;

use tagcache_core::{expires, Backend, CacheError, ErrorList, Result};

use super::config::RedisConfig;

const SCAN_BATCH: usize = 1000;

/// Redis backend implementation
///
/// Keys are stored as `<prefix><key>`. TTLs are set with millisecond
/// precision.
#[derive(Clone)]
pub struct RedisBackend {
    pool: Pool<RedisConnectionManager>,
    config: RedisConfig,
    closed: Arc<AtomicBool>,
}

impl RedisBackend {
    /// Create a new Redis backend
    pub async fn new(config: RedisConfig) -> Result<Self> {
        let manager = RedisConnectionManager::new(config.url.as_str())
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        let pool = Pool::builder()
            .max_size(config.pool_size)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|e| CacheError::Connection(e.to_string()))?;

        debug!(target: "tagcache::redis", url = %config.url, prefix = %config.key_prefix, "redis pool ready");

        Ok(Self {
            pool,
            config,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &RedisConfig {
        &self.config
    }

    /// Get connection from pool
    async fn get_connection(&self) -> Result<PooledConnection<'_, RedisConnectionManager>> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }

        self.pool.get().await.map_err(|e| match e {
            RunError::TimedOut => CacheError::Timeout,
            RunError::User(e) => CacheError::Connection(e.to_string()),
        })
    }
}

fn prefixed_key(prefix: &str, key: &str) -> String {
    format!("{}{}", prefix, key)
}

/// SCAN pattern matching every key under `prefix`, taken literally
fn scan_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

fn backend_error(e: redis::RedisError) -> CacheError {
    CacheError::Backend(e.to_string())
}

#[async_trait]
impl Backend for RedisBackend {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let mut conn = self.get_connection().await?;
        let prefixed = prefixed_key(&self.config.key_prefix, key);

        let bytes: Option<Vec<u8>> = conn.get(&prefixed).await.map_err(backend_error)?;
        bytes.ok_or_else(|| CacheError::absent(key))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let prefixed = prefixed_key(&self.config.key_prefix, key);

        match expires(ttl) {
            Some(ttl) => {
                let millis = ttl.as_millis().clamp(1, u64::MAX as u128) as u64;
                let _: () = conn
                    .pset_ex(&prefixed, value, millis)
                    .await
                    .map_err(backend_error)?;
            }
            None => {
                let _: () = conn.set(&prefixed, value).await.map_err(backend_error)?;
            }
        }
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let prefixed = prefixed_key(&self.config.key_prefix, key);

        let _: u64 = conn.del(&prefixed).await.map_err(backend_error)?;
        Ok(())
    }

    async fn del_all(&self) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let pattern = scan_pattern(&self.config.key_prefix);

        let mut errors = ErrorList::new();
        let mut cursor = 0u64;
        loop {
            let scanned: redis::RedisResult<(u64, Vec<String>)> = redis::cmd("SCAN")
                .cursor_arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut *conn)
                .await;

            // Without a cursor there is no way to continue the walk
            let (next_cursor, keys) = match scanned {
                Ok(page) => page,
                Err(e) => {
                    errors.push(backend_error(e));
                    break;
                }
            };

            if !keys.is_empty() {
                let unlinked: redis::RedisResult<u64> = conn.unlink(&keys).await;
                errors.check(unlinked.map_err(backend_error));
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        errors.finish()
    }

    async fn close(&self) -> Result<()> {
        if !self.closed.swap(true, Ordering::AcqRel) {
            debug!(target: "tagcache::redis", "redis backend closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_key() {
        assert_eq!(prefixed_key("app:", "value:user"), "app:value:user");
        assert_eq!(prefixed_key("", "keys:t"), "keys:t");
    }

    #[test]
    fn test_scan_pattern_escapes_globs() {
        assert_eq!(scan_pattern("tagcache:"), "tagcache:*");
        assert_eq!(scan_pattern("a*b?[c]"), "a\\*b\\?\\[c\\]*");
        assert_eq!(scan_pattern(""), "*");
    }

    #[test]
    fn test_config_builder() {
        let config = RedisConfig::new("redis://example:6379")
            .pool_size(4)
            .prefix("svc:")
            .connection_timeout(Duration::from_millis(250));

        assert_eq!(config.url, "redis://example:6379");
        assert_eq!(config.pool_size, 4);
        assert_eq!(config.key_prefix, "svc:");
        assert_eq!(config.connection_timeout, Duration::from_millis(250));
    }
}
