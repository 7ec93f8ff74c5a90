//! Configuration Module
//!
//! Construction parameters for a cache instance.

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_BUCKET_COUNT;

/// Cache configuration parameters.
///
/// Every field has a sensible default, so partial documents deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Number of hash buckets, fixed for the lifetime of the cache
    pub bucket_count: usize,
    /// Maximum number of entries (0 = unlimited)
    pub max_entries: usize,
    /// Interval in seconds between runs of the background sweeper
    pub sweep_interval_secs: u64,
}

impl CacheConfig {
    /// Creates a configuration with the given capacity and default buckets.
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries,
            ..Self::default()
        }
    }

    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_sweep_interval(mut self, secs: u64) -> Self {
        self.sweep_interval_secs = secs;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            max_entries: 0,
            sweep_interval_secs: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.bucket_count, 1024);
        assert_eq!(config.max_entries, 0);
        assert_eq!(config.sweep_interval_secs, 1);
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::new(10)
            .with_bucket_count(16)
            .with_sweep_interval(5);
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.bucket_count, 16);
        assert_eq!(config.sweep_interval_secs, 5);
    }

    #[test]
    fn test_config_partial_deserialize() {
        let config: CacheConfig = serde_json::from_str(r#"{"max_entries": 50}"#).unwrap();
        assert_eq!(config.max_entries, 50);
        assert_eq!(config.bucket_count, DEFAULT_BUCKET_COUNT);
    }

    #[test]
    fn test_config_serialize_roundtrip() {
        let config = CacheConfig::new(3).with_bucket_count(8);
        let json = serde_json::to_string(&config).unwrap();
        let parsed: CacheConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
