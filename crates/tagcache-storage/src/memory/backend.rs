//! In-memory cache backend using a lock-guarded map

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tagcache_core::{expires, Backend, CacheError, Result};

use super::sweeper::Sweeper;

/// Configuration for the memory backend
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// How often expired entries are swept (zero = never)
    pub cleanup_interval: Duration,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            cleanup_interval: Duration::from_secs(60),
        }
    }
}

impl MemoryConfig {
    /// Create config with a specific sweep period
    pub fn with_cleanup_interval(interval: Duration) -> Self {
        Self {
            cleanup_interval: interval,
        }
    }

    /// Create config with no background sweep; expired entries are only
    /// hidden from reads until [`MemoryBackend::delete_expired`] runs
    pub fn without_sweeper() -> Self {
        Self {
            cleanup_interval: Duration::ZERO,
        }
    }
}

/// A stored value with its absolute expiration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub value: Vec<u8>,
    /// `None` never expires
    pub expires_at: Option<Instant>,
}

impl Item {
    /// Create an item expiring `ttl` from now
    ///
    /// A TTL too large to represent as an instant never expires.
    pub fn new(value: Vec<u8>, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: expires(ttl).and_then(|ttl| Instant::now().checked_add(ttl)),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    fn is_expired_at(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(at) if now > at)
    }
}

/// Shared state behind every handle of one backend
#[derive(Debug, Default)]
pub(crate) struct Store {
    items: RwLock<HashMap<String, Item>>,
}

impl Store {
    /// Remove every entry past its expiration, returning how many went
    pub(crate) fn delete_expired(&self) -> usize {
        let now = Instant::now();
        let mut items = self.items.write();
        let before = items.len();
        items.retain(|_, item| !item.is_expired_at(now));
        before - items.len()
    }
}

/// In-memory cache backend
///
/// Entries are evicted by time only. Reads check expiration themselves, so
/// a stale entry is never returned even if the sweeper hasn't reached it.
/// Cloning creates a new handle to the SAME underlying store and sweeper.
#[derive(Clone)]
pub struct MemoryBackend {
    store: Arc<Store>,
    sweeper: Option<Arc<Sweeper>>,
    config: MemoryConfig,
}

impl MemoryBackend {
    /// Create a new memory backend
    ///
    /// The sweeper is spawned on the current tokio runtime when
    /// `cleanup_interval` is positive.
    pub fn new(config: MemoryConfig) -> Self {
        Self::from_items(config, HashMap::new())
    }

    /// Create with default configuration
    pub fn with_defaults() -> Self {
        Self::new(MemoryConfig::default())
    }

    /// Create a backend pre-filled with `items`
    pub fn from_items(config: MemoryConfig, items: HashMap<String, Item>) -> Self {
        let store = Arc::new(Store {
            items: RwLock::new(items),
        });

        let sweeper = if config.cleanup_interval.is_zero() {
            None
        } else {
            Sweeper::spawn(&store, config.cleanup_interval).map(Arc::new)
        };

        Self {
            store,
            sweeper,
            config,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Whether a background sweeper was started for this store
    pub fn has_sweeper(&self) -> bool {
        self.sweeper.is_some()
    }

    /// Remove expired entries now, returning how many were removed
    pub fn delete_expired(&self) -> usize {
        self.store.delete_expired()
    }

    /// Snapshot of every live entry
    pub fn items(&self) -> HashMap<String, Item> {
        let now = Instant::now();
        self.store
            .items
            .read()
            .iter()
            .filter(|(_, item)| !item.is_expired_at(now))
            .map(|(key, item)| (key.clone(), item.clone()))
            .collect()
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.store.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let items = self.store.items.read();
        match items.get(key) {
            Some(item) if item.is_expired() => Err(CacheError::expired(key)),
            Some(item) => Ok(item.value.clone()),
            None => Err(CacheError::absent(key)),
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let item = Item::new(value, ttl);
        self.store.items.write().insert(key.to_string(), item);
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<()> {
        self.store.items.write().remove(key);
        Ok(())
    }

    async fn del_all(&self) -> Result<()> {
        self.store.items.write().clear();
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        if let Some(sweeper) = &self.sweeper {
            sweeper.shutdown().await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagcache_core::MissReason;

    fn unswept() -> MemoryBackend {
        MemoryBackend::new(MemoryConfig::without_sweeper())
    }

    #[tokio::test]
    async fn test_basic_get_set() {
        let backend = unswept();

        backend
            .set("key1", b"value1".to_vec(), Some(Duration::from_secs(60)))
            .await
            .unwrap();

        assert_eq!(backend.get("key1").await.unwrap(), b"value1".to_vec());
    }

    #[tokio::test]
    async fn test_overwrite() {
        let backend = unswept();

        backend.set("key1", b"a".to_vec(), None).await.unwrap();
        backend.set("key1", b"b".to_vec(), None).await.unwrap();

        assert_eq!(backend.get("key1").await.unwrap(), b"b".to_vec());
        assert_eq!(backend.len(), 1);
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let backend = unswept();
        let err = backend.get("nonexistent").await.unwrap_err();
        assert_eq!(err.miss_reason(), Some(MissReason::Absent));
    }

    #[tokio::test]
    async fn test_expired_entry_is_hidden_before_sweep() {
        let backend = unswept();

        backend
            .set("key1", b"value1".to_vec(), Some(Duration::from_millis(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        let err = backend.get("key1").await.unwrap_err();
        assert_eq!(err.miss_reason(), Some(MissReason::Expired));
        // Still physically present
        assert_eq!(backend.len(), 1);
        assert!(backend.items().is_empty());
    }

    #[tokio::test]
    async fn test_zero_ttl_never_expires() {
        let backend = unswept();

        backend
            .set("key1", b"value1".to_vec(), Some(Duration::ZERO))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        assert!(backend.get("key1").await.is_ok());
        assert_eq!(backend.items()["key1"].expires_at, None);
    }

    #[tokio::test]
    async fn test_huge_ttl_never_expires() {
        let backend = unswept();

        backend
            .set("key1", b"value1".to_vec(), Some(Duration::MAX))
            .await
            .unwrap();

        assert_eq!(backend.get("key1").await.unwrap(), b"value1".to_vec());
        assert_eq!(backend.items()["key1"].expires_at, None);
        assert_eq!(backend.delete_expired(), 0);
    }

    #[test]
    fn test_expires_strictly_after_deadline() {
        let at = Instant::now();
        let item = Item {
            value: b"v".to_vec(),
            expires_at: Some(at),
        };

        assert!(!item.is_expired_at(at));
        assert!(item.is_expired_at(at + Duration::from_millis(1)));
    }

    #[tokio::test]
    async fn test_delete() {
        let backend = unswept();

        backend.set("key1", b"value1".to_vec(), None).await.unwrap();
        backend.del("key1").await.unwrap();
        assert!(backend.get("key1").await.unwrap_err().is_not_found());

        // Absent keys are fine
        backend.del("key1").await.unwrap();
    }

    #[tokio::test]
    async fn test_del_all() {
        let backend = unswept();

        backend.set("key1", b"value1".to_vec(), None).await.unwrap();
        backend.set("key2", b"value2".to_vec(), None).await.unwrap();
        assert_eq!(backend.len(), 2);

        backend.del_all().await.unwrap();
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn test_delete_expired() {
        let backend = unswept();

        backend
            .set("short", b"x".to_vec(), Some(Duration::from_millis(1)))
            .await
            .unwrap();
        backend.set("forever", b"y".to_vec(), None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(backend.delete_expired(), 1);
        assert_eq!(backend.len(), 1);
        assert!(backend.get("forever").await.is_ok());
    }

    #[tokio::test]
    async fn test_sweeper_evicts() {
        let backend = MemoryBackend::new(MemoryConfig::with_cleanup_interval(
            Duration::from_millis(10),
        ));
        assert!(backend.has_sweeper());

        backend
            .set("key1", b"value1".to_vec(), Some(Duration::from_millis(1)))
            .await
            .unwrap();
        backend.set("key2", b"value2".to_vec(), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(backend.len(), 1);

        backend.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_close_stops_sweeper() {
        let backend = MemoryBackend::new(MemoryConfig::with_cleanup_interval(
            Duration::from_millis(10),
        ));

        backend.close().await.unwrap();
        // Second release is a no-op
        backend.close().await.unwrap();

        backend
            .set("key1", b"value1".to_vec(), Some(Duration::from_millis(1)))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(backend.len(), 1);
        assert!(backend.get("key1").await.is_err());
    }

    #[test]
    fn test_no_runtime_no_sweeper() {
        let backend = MemoryBackend::with_defaults();
        assert!(!backend.has_sweeper());
    }

    #[tokio::test]
    async fn test_from_items_and_clone_share_store() {
        let mut items = HashMap::new();
        items.insert("seed".to_string(), Item::new(b"1".to_vec(), None));

        let backend = MemoryBackend::from_items(MemoryConfig::without_sweeper(), items);
        let other = backend.clone();

        other.set("key", b"2".to_vec(), None).await.unwrap();

        assert_eq!(backend.get("seed").await.unwrap(), b"1".to_vec());
        assert_eq!(backend.get("key").await.unwrap(), b"2".to_vec());
        assert_eq!(backend.items().len(), 2);
    }
}
