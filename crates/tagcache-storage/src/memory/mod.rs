//! In-memory cache backend

mod backend;
mod sweeper;

pub use backend::{Item, MemoryBackend, MemoryConfig};
