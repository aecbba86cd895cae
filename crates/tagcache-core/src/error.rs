//! Error types for cache operations

use std::fmt;

use thiserror::Error;

/// Why a lookup came back empty
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissReason {
    /// The key was never stored or has been deleted
    Absent,
    /// The key was stored but its TTL has passed
    Expired,
    /// At least one store failed to answer, the rest missed
    Upstream,
}

impl MissReason {
    /// Get reason as string label
    pub fn as_str(&self) -> &'static str {
        match self {
            MissReason::Absent => "absent",
            MissReason::Expired => "expired",
            MissReason::Upstream => "upstream failure",
        }
    }
}

impl fmt::Display for MissReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a [`CacheError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Serialization,
    Deserialization,
    Connection,
    Backend,
    Timeout,
    Closed,
    Multiple,
}

/// Main error type for all cache operations
#[derive(Error, Debug, Clone)]
pub enum CacheError {
    /// Key not found in cache, or found but expired
    #[error("key not found: {key} ({reason})")]
    NotFound { key: String, reason: MissReason },

    /// Serialization failed
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Backend connection failed
    #[error("connection error: {0}")]
    Connection(String),

    /// Backend operation failed
    #[error("backend error: {0}")]
    Backend(String),

    /// Timeout
    #[error("operation timed out")]
    Timeout,

    /// The backend has been released
    #[error("backend is closed")]
    Closed,

    /// Several independent failures from one fan-out operation
    #[error("{}", join_messages(.0))]
    Multiple(Vec<CacheError>),
}

fn join_messages(errors: &[CacheError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

impl CacheError {
    /// Miss for a key that was never stored
    pub fn absent(key: impl Into<String>) -> Self {
        CacheError::NotFound {
            key: key.into(),
            reason: MissReason::Absent,
        }
    }

    /// Miss for a key whose TTL has passed
    pub fn expired(key: impl Into<String>) -> Self {
        CacheError::NotFound {
            key: key.into(),
            reason: MissReason::Expired,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheError::NotFound { .. } => ErrorKind::NotFound,
            CacheError::Serialization(_) => ErrorKind::Serialization,
            CacheError::Deserialization(_) => ErrorKind::Deserialization,
            CacheError::Connection(_) => ErrorKind::Connection,
            CacheError::Backend(_) => ErrorKind::Backend,
            CacheError::Timeout => ErrorKind::Timeout,
            CacheError::Closed => ErrorKind::Closed,
            CacheError::Multiple(_) => ErrorKind::Multiple,
        }
    }

    /// True for a plain miss. An aggregate is never a miss, even if it holds one.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound { .. })
    }

    /// Reason attached to a miss, if this is one
    pub fn miss_reason(&self) -> Option<MissReason> {
        match self {
            CacheError::NotFound { reason, .. } => Some(*reason),
            _ => None,
        }
    }

    /// The errors making up this one: the members of an aggregate, or itself.
    pub fn errors(&self) -> &[CacheError] {
        match self {
            CacheError::Multiple(errors) => errors,
            other => std::slice::from_ref(other),
        }
    }

    /// Every leaf error, descending into nested aggregates
    pub fn iter_flat(&self) -> Box<dyn Iterator<Item = &CacheError> + '_> {
        match self {
            CacheError::Multiple(errors) => Box::new(errors.iter().flat_map(|e| e.iter_flat())),
            other => Box::new(std::iter::once(other)),
        }
    }

    /// Whether any leaf error satisfies `pred`
    pub fn contains(&self, pred: impl Fn(&CacheError) -> bool) -> bool {
        self.iter_flat().any(pred)
    }
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

/// Accumulates failures from a fan-out so every unit of work can still run.
///
/// `finish` yields `Ok(())` when nothing failed, the error itself when exactly
/// one did, and [`CacheError::Multiple`] otherwise.
#[derive(Debug, Default)]
pub struct ErrorList {
    errors: Vec<CacheError>,
}

impl ErrorList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error of `result`, if any
    pub fn check<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.push(err);
                None
            }
        }
    }

    pub fn push(&mut self, err: CacheError) {
        self.errors.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn finish(mut self) -> Result<()> {
        match self.errors.len() {
            0 => Ok(()),
            1 => Err(self.errors.remove(0)),
            _ => Err(CacheError::Multiple(self.errors)),
        }
    }
}
