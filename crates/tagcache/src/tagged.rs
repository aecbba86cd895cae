//! Tag-indexed cache over a single backend
//!
//! Each logical entry is kept as three independent backend entries:
//!
//! - `value:<key>`: the serialized value
//! - `tags:<key>`: the tags the key was last written with
//! - `keys:<tag>`: the keys currently carrying the tag, without duplicates
//!
//! The index is maintained with several sequential backend calls and no
//! transaction, so concurrent writers or a partial failure can leave it
//! briefly inconsistent. Write failures inside the index are never dropped;
//! they come back to the caller joined into one error.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use tagcache_core::{Backend, Cache, ErrorList, JsonSerializer, Result, Serializer};

const VALUE_PREFIX: &str = "value:";
const TAGS_PREFIX: &str = "tags:";
const KEYS_PREFIX: &str = "keys:";

fn value_key(key: &str) -> String {
    format!("{VALUE_PREFIX}{key}")
}

fn tags_key(key: &str) -> String {
    format!("{TAGS_PREFIX}{key}")
}

fn keys_key(tag: &str) -> String {
    format!("{KEYS_PREFIX}{tag}")
}

/// Configuration for TagCache
#[derive(Debug, Clone)]
pub struct TagCacheConfig {
    /// TTL applied to values and index entries (`None` = never expire)
    pub item_ttl: Option<Duration>,
}

impl Default for TagCacheConfig {
    fn default() -> Self {
        Self {
            item_ttl: Some(Duration::from_secs(24 * 60 * 60)),
        }
    }
}

impl TagCacheConfig {
    /// Create config with specific item TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            item_ttl: Some(ttl),
        }
    }

    /// Create config whose entries never expire
    pub fn no_expiry() -> Self {
        Self { item_ttl: None }
    }
}

/// Tag-aware cache storing everything in one [`Backend`]
///
/// Generic over:
/// - `B`: The storage backend (Memory, Redis, Chain, ...)
/// - `S`: The serializer (JSON by default)
///
/// Cloning shares the backend.
pub struct TagCache<B, S = JsonSerializer>
where
    B: Backend,
    S: Serializer,
{
    backend: Arc<B>,
    serializer: S,
    config: TagCacheConfig,
}

impl<B: Backend> TagCache<B, JsonSerializer> {
    /// Create a new TagCache with the JSON serializer and default config
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, TagCacheConfig::default())
    }

    /// Create with custom config
    pub fn with_config(backend: B, config: TagCacheConfig) -> Self {
        Self::with_serializer(backend, JsonSerializer, config)
    }
}

impl<B, S> TagCache<B, S>
where
    B: Backend,
    S: Serializer,
{
    /// Create a TagCache with a custom serializer
    pub fn with_serializer(backend: B, serializer: S, config: TagCacheConfig) -> Self {
        Self {
            backend: Arc::new(backend),
            serializer,
            config,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &TagCacheConfig {
        &self.config
    }

    /// Keys currently indexed under `tag`; empty if the tag is unknown
    pub async fn keys_by_tag(&self, tag: &str) -> Result<Vec<String>> {
        self.read_list(&keys_key(tag)).await
    }

    /// Tags `key` was last written with; empty if the key is unknown
    pub async fn tags_by_key(&self, key: &str) -> Result<Vec<String>> {
        self.read_list(&tags_key(key)).await
    }

    /// Release the backend's connections and background tasks
    pub async fn close(&self) -> Result<()> {
        self.backend.close().await
    }

    async fn write<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let bytes = self.serializer.serialize(value)?;
        self.backend.set(key, bytes, self.config.item_ttl).await
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let bytes = self.backend.get(key).await?;
        self.serializer.deserialize(&bytes)
    }

    async fn read_list(&self, key: &str) -> Result<Vec<String>> {
        match self.read(key).await {
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            other => other,
        }
    }

    /// Read a list the caller can rebuild from scratch if it is unreadable
    async fn read_list_lenient(&self, key: &str) -> Vec<String> {
        match self.read(key).await {
            Ok(list) => list,
            Err(e) => {
                if !e.is_not_found() {
                    warn!(target: "tagcache", key, error = %e, "unreadable index entry, starting empty");
                }
                Vec::new()
            }
        }
    }

    /// Add `key` to the key list of `tag` unless it is already there
    async fn link(&self, tag: &str, key: &str) -> Result<()> {
        let list_key = keys_key(tag);
        let mut keys = self.read_list_lenient(&list_key).await;
        if keys.iter().any(|k| k == key) {
            return Ok(());
        }

        keys.push(key.to_string());
        self.write(&list_key, &keys).await
    }

    /// Drop `key` from the key list of `tag`
    async fn unlink(&self, tag: &str, key: &str) -> Result<()> {
        let list_key = keys_key(tag);
        let mut keys: Vec<String> = self.read(&list_key).await?;
        let before = keys.len();
        keys.retain(|k| k != key);
        if keys.len() == before {
            return Ok(());
        }

        self.write(&list_key, &keys).await
    }
}

#[async_trait]
impl<B, S> Cache for TagCache<B, S>
where
    B: Backend,
    S: Serializer,
{
    async fn set<T>(&self, key: &str, value: &T, tags: &[&str]) -> Result<()>
    where
        T: Serialize + Sync,
    {
        debug!(target: "tagcache", key, tags = ?tags, "set");

        let tag_key = tags_key(key);
        let previous = self.read_list_lenient(&tag_key).await;

        self.write(&value_key(key), value).await?;

        let tags: Vec<String> = tags.iter().map(|t| t.to_string()).collect();
        self.write(&tag_key, &tags).await?;

        let mut errors = ErrorList::new();
        for tag in &tags {
            errors.check(self.link(tag, key).await);
        }

        // Memberships the key no longer has
        for tag in previous.iter().filter(|t| !tags.contains(t)) {
            match self.unlink(tag, key).await {
                Err(e) if e.is_not_found() => {}
                other => {
                    errors.check(other);
                }
            }
        }

        errors.finish()
    }

    async fn get<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Send,
    {
        self.read(&value_key(key)).await
    }

    async fn del_by_key(&self, key: &str) -> Result<()> {
        debug!(target: "tagcache", key, "delete by key");

        let mut errors = ErrorList::new();
        errors.check(self.backend.del(&value_key(key)).await);

        let tag_key = tags_key(key);
        let tags: Vec<String> = errors
            .check(self.read(&tag_key).await)
            .unwrap_or_default();
        errors.check(self.backend.del(&tag_key).await);

        for tag in &tags {
            errors.check(self.unlink(tag, key).await);
        }

        errors.finish()
    }

    async fn del_by_tag(&self, tag: &str) -> Result<()> {
        debug!(target: "tagcache", tag, "delete by tag");

        let list_key = keys_key(tag);
        let keys: Vec<String> = self.read(&list_key).await?;

        let mut errors = ErrorList::new();
        for key in &keys {
            errors.check(self.del_by_key(key).await);
        }
        errors.check(self.backend.del(&list_key).await);

        errors.finish()
    }

    async fn del_all(&self) -> Result<()> {
        debug!(target: "tagcache", "delete all");
        self.backend.del_all().await
    }
}

impl<B, S> Clone for TagCache<B, S>
where
    B: Backend,
    S: Serializer,
{
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            serializer: self.serializer.clone(),
            config: self.config.clone(),
        }
    }
}
