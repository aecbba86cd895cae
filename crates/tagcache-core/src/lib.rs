//! tagcache-core: Core traits and types for the tagcache library
//!
//! This crate provides the storage contract ([`Backend`]), the tag-aware
//! cache contract ([`Cache`]), pluggable serializers and the shared error
//! taxonomy used throughout the tagcache ecosystem.

mod error;
mod traits;

pub use error::{CacheError, ErrorKind, ErrorList, MissReason, Result};
pub use traits::*;
