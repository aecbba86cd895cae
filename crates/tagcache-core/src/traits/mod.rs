//! Core traits for cache operations

mod backend;
mod cache;
mod serializer;

pub use backend::{expires, Backend};
pub use cache::Cache;
pub use serializer::{JsonSerializer, Serializer};

#[cfg(feature = "msgpack")]
pub use serializer::MsgPackSerializer;
