//! Tag-aware cache contract

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::Result;

/// A cache whose entries can be invalidated individually or by tag
#[async_trait]
pub trait Cache: Send + Sync {
    /// Store `value` under `key`, replacing the key's previous tags with `tags`
    async fn set<T>(&self, key: &str, value: &T, tags: &[&str]) -> Result<()>
    where
        T: Serialize + Sync;

    /// Fetch and decode the value under `key`
    async fn get<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned + Send;

    /// Remove `key` and its tag memberships
    async fn del_by_key(&self, key: &str) -> Result<()>;

    /// Remove every key carrying `tag`, then the tag itself
    async fn del_by_tag(&self, tag: &str) -> Result<()>;

    /// Wipe the whole cache
    async fn del_all(&self) -> Result<()>;
}
