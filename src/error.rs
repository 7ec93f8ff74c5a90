//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use std::collections::TryReserveError;

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Key was present but its TTL had elapsed; it was evicted by this lookup
    #[error("Key expired: {0}")]
    Expired(String),

    /// Key exists but carries no expiry
    #[error("Key has no TTL: {0}")]
    NoTtl(String),

    /// A new key was refused because the cache is at capacity
    #[error("Cache full: capacity of {max_entries} entries reached")]
    CapacityExceeded { max_entries: usize },

    /// Key cannot be stored (contains a NUL byte)
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Configuration rejected at construction
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Allocation for the bucket array, a key or a value buffer failed
    #[error("Out of memory: {0}")]
    OutOfMemory(#[from] TryReserveError),

    /// Snapshot file could not be opened, read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Returns true for the "not found" class: absent or lazily expired keys.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::NotFound(_) | CacheError::Expired(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_miss() {
        assert!(CacheError::NotFound("k".to_string()).is_miss());
        assert!(CacheError::Expired("k".to_string()).is_miss());
        assert!(!CacheError::NoTtl("k".to_string()).is_miss());
        assert!(!CacheError::CapacityExceeded { max_entries: 2 }.is_miss());
    }

    #[test]
    fn test_error_messages() {
        let err = CacheError::CapacityExceeded { max_entries: 2 };
        assert_eq!(err.to_string(), "Cache full: capacity of 2 entries reached");

        let err = CacheError::NotFound("user:1".to_string());
        assert_eq!(err.to_string(), "Key not found: user:1");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: CacheError = io.into();
        assert!(matches!(err, CacheError::Io(_)));
    }
}
