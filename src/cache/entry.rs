//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

// == Cache Entry ==
/// A single key with its binary value and optional expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    /// The key, unique within a cache
    pub key: String,
    /// The stored value
    pub value: Vec<u8>,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that never expires.
    pub fn new(key: String, value: Vec<u8>) -> Self {
        Self {
            key,
            value,
            expires_at: None,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired as of `now_ms`.
    ///
    /// An entry is expired once the current time reaches its expiration
    /// time, so a TTL is never honoured for longer than requested.
    pub fn is_expired_at(&self, now_ms: u64) -> bool {
        match self.expires_at {
            Some(expires) => now_ms >= expires,
            None => false,
        }
    }

    // == Set TTL ==
    /// Sets the expiry to `ttl_seconds` from `now_ms`; zero clears it.
    pub fn set_ttl(&mut self, ttl_seconds: u64, now_ms: u64) {
        self.expires_at = if ttl_seconds > 0 {
            Some(now_ms.saturating_add(ttl_seconds.saturating_mul(1000)))
        } else {
            None
        };
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds as of `now_ms`.
    ///
    /// # Returns
    /// - `Some(0)` if the entry has expired (TTL elapsed)
    /// - `Some(remaining_ms)` if the entry has TTL and hasn't expired
    /// - `None` if the entry has no TTL (never expires)
    pub fn ttl_remaining_ms_at(&self, now_ms: u64) -> Option<u64> {
        self.expires_at.map(|expires| expires.saturating_sub(now_ms))
    }

    /// Returns remaining TTL in whole seconds, rounded up, as of `now_ms`.
    ///
    /// Rounding up means a freshly set TTL of N seconds reports N, and any
    /// live entry with a TTL reports at least 1.
    pub fn ttl_remaining_at(&self, now_ms: u64) -> Option<u64> {
        self.ttl_remaining_ms_at(now_ms).map(|ms| ms.div_ceil(1000))
    }

    // == Footprint ==
    /// Approximate bytes held by this entry: the entry itself, the value,
    /// the key and its terminator.
    pub fn footprint(&self) -> usize {
        std::mem::size_of::<CacheEntry>() + self.value.len() + self.key.len() + 1
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
///
/// A clock set before the epoch reads as 0, which makes every TTL look
/// unexpired rather than aborting the caller.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
