//! tagcache: Tag-aware caching over pluggable storage backends
//!
//! # Features
//!
//! - **Tag invalidation**: drop every key sharing a label in one call
//! - **Pluggable backends**: in-memory with a background expiry sweep, Redis
//! - **Chaining**: fallback reads and fan-out writes across several stores
//! - **Pluggable serialization** (JSON, MessagePack)
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use tagcache::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
//!     let backend = MemoryBackend::new(MemoryConfig::default());
//!     let cache = TagCache::new(backend);
//!
//!     cache.set("user:1", &"Alice", &["users"]).await?;
//!     let name: String = cache.get("user:1").await?;
//!     println!("Got: {}", name);
//!
//!     cache.del_by_tag("users").await?;
//!     assert!(cache.get::<String>("user:1").await.unwrap_err().is_not_found());
//!
//!     cache.close().await?;
//!     Ok(())
//! }
//! ```

mod nop;
mod tagged;

// Re-export core
pub use tagcache_core::*;

// Re-export storage
pub use tagcache_storage::ChainBackend;

#[cfg(feature = "memory")]
pub use tagcache_storage::{Item, MemoryBackend, MemoryConfig};

#[cfg(feature = "redis")]
pub use tagcache_storage::{RedisBackend, RedisConfig};

pub use nop::NopCache;
pub use tagged::{TagCache, TagCacheConfig};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Backend, Cache, CacheError, ChainBackend, ErrorKind, JsonSerializer, MissReason,
        NopCache, Result, Serializer, TagCache, TagCacheConfig,
    };

    #[cfg(feature = "memory")]
    pub use crate::{MemoryBackend, MemoryConfig};

    #[cfg(feature = "redis")]
    pub use crate::{RedisBackend, RedisConfig};

    #[cfg(feature = "msgpack")]
    pub use crate::MsgPackSerializer;
}
