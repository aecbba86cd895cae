use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use tagcache_core::{Backend, CacheError, ErrorList, MissReason, Result};

/// Backend composed of an ordered list of other backends
///
/// Reads probe the backends in order and return the first hit; a hit in a
/// later backend is not copied into earlier ones. Writes, deletes and
/// `close` run against every backend and report all failures together.
#[derive(Clone, Default)]
pub struct ChainBackend {
    backends: Vec<Arc<dyn Backend>>,
}

impl ChainBackend {
    /// Create a chain from backends in probe order
    pub fn new(backends: Vec<Arc<dyn Backend>>) -> Self {
        Self { backends }
    }

    /// Append a backend, probed after the existing ones
    pub fn push(mut self, backend: impl Backend) -> Self {
        self.backends.push(Arc::new(backend));
        self
    }

    pub fn backends(&self) -> &[Arc<dyn Backend>] {
        &self.backends
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl fmt::Debug for ChainBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainBackend")
            .field("backends", &self.backends.len())
            .finish()
    }
}

#[async_trait]
impl Backend for ChainBackend {
    async fn get(&self, key: &str) -> Result<Vec<u8>> {
        let mut reason = MissReason::Absent;
        let mut upstream_failed = false;

        for (tier, backend) in self.backends.iter().enumerate() {
            match backend.get(key).await {
                Ok(value) => return Ok(value),
                Err(CacheError::NotFound { reason: r, .. }) => reason = r,
                Err(e) => {
                    warn!(target: "tagcache::chain", tier, key, error = %e, "backend read failed");
                    upstream_failed = true;
                }
            }
        }

        Err(CacheError::NotFound {
            key: key.to_string(),
            reason: if upstream_failed {
                MissReason::Upstream
            } else {
                reason
            },
        })
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Option<Duration>) -> Result<()> {
        let mut errors = ErrorList::new();
        for backend in &self.backends {
            errors.check(backend.set(key, value.clone(), ttl).await);
        }
        errors.finish()
    }

    async fn del(&self, key: &str) -> Result<()> {
        let mut errors = ErrorList::new();
        for backend in &self.backends {
            errors.check(backend.del(key).await);
        }
        errors.finish()
    }

    async fn del_all(&self) -> Result<()> {
        let mut errors = ErrorList::new();
        for backend in &self.backends {
            errors.check(backend.del_all().await);
        }
        errors.finish()
    }

    async fn close(&self) -> Result<()> {
        let mut errors = ErrorList::new();
        for backend in &self.backends {
            errors.check(backend.close().await);
        }
        errors.finish()
    }
}
