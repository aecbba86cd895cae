//! Redis backend implementation

mod backend;
mod config;

pub use backend::RedisBackend;
pub use config::RedisConfig;
