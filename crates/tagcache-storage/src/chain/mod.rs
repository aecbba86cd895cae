//! Chained backend: fallback reads, fan-out writes

mod backend;

pub use backend::ChainBackend;
