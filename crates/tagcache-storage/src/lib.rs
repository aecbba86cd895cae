//! tagcache-storage: Storage backends for tagcache

pub mod chain;

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "redis")]
pub mod redis;

pub use chain::ChainBackend;

#[cfg(feature = "memory")]
pub use memory::{Item, MemoryBackend, MemoryConfig};

#[cfg(feature = "redis")]
pub use self::redis::{RedisBackend, RedisConfig};
