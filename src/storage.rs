//! Unified Storage Adapter
//!
//! A small backend-agnostic key/value interface. The in-memory backend maps
//! each call one-to-one onto the cache operations.

use tracing::debug;

use crate::cache::{Cache, SharedCache};
use crate::config::CacheConfig;
use crate::error::Result;

/// Backend selector for [`open`].
#[derive(Debug, Clone)]
pub enum Backend {
    /// Process-local cache, unsynchronized
    Memory(CacheConfig),
    /// Process-local cache behind a lock, safe to share between threads
    SharedMemory(CacheConfig),
}

/// Operations every storage backend provides.
pub trait KeyValueStore: Send {
    fn set(&mut self, key: &str, value: &[u8]) -> Result<()>;
    fn get(&mut self, key: &str) -> Result<Vec<u8>>;
    /// Returns true iff the key was present.
    fn remove(&mut self, key: &str) -> bool;
    fn count(&self) -> usize;
    fn exists(&mut self, key: &str) -> bool;
    fn keys(&self) -> Vec<String>;
}

/// Opens a store for the selected backend.
pub fn open(backend: Backend) -> Result<Box<dyn KeyValueStore>> {
    debug!(?backend, "opening storage backend");
    Ok(match backend {
        Backend::Memory(config) => Box::new(Cache::with_config(config)?),
        Backend::SharedMemory(config) => Box::new(Cache::with_config(config)?.threadsafe()),
    })
}

impl KeyValueStore for Cache {
    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.set_binary(key, value)
    }

    fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        self.get_binary(key)
    }

    fn remove(&mut self, key: &str) -> bool {
        Cache::remove(self, key)
    }

    fn count(&self) -> usize {
        Cache::count(self)
    }

    fn exists(&mut self, key: &str) -> bool {
        Cache::exists(self, key)
    }

    fn keys(&self) -> Vec<String> {
        Cache::keys(self)
    }
}

impl KeyValueStore for SharedCache {
    fn set(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.set_binary(key, value)
    }

    fn get(&mut self, key: &str) -> Result<Vec<u8>> {
        self.get_binary(key)
    }

    fn remove(&mut self, key: &str) -> bool {
        SharedCache::remove(self, key)
    }

    fn count(&self) -> usize {
        SharedCache::count(self)
    }

    fn exists(&mut self, key: &str) -> bool {
        SharedCache::exists(self, key)
    }

    fn keys(&self) -> Vec<String> {
        SharedCache::keys(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &mut dyn KeyValueStore) {
        store.set("a", b"1").unwrap();
        store.set("b", b"2").unwrap();

        assert_eq!(store.get("a").unwrap(), b"1");
        assert!(store.exists("b"));
        assert_eq!(store.count(), 2);

        let mut keys = store.keys();
        keys.sort();
        assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);

        assert!(store.remove("a"));
        assert!(!store.remove("a"));
        assert!(store.get("a").unwrap_err().is_miss());
    }

    #[test]
    fn test_memory_backend() {
        let mut store = open(Backend::Memory(CacheConfig::default())).unwrap();
        exercise(store.as_mut());
    }

    #[test]
    fn test_shared_memory_backend() {
        let mut store = open(Backend::SharedMemory(CacheConfig::new(10))).unwrap();
        exercise(store.as_mut());
    }

    #[test]
    fn test_invalid_config_fails_open() {
        let result = open(Backend::Memory(CacheConfig::default().with_bucket_count(0)));
        assert!(result.is_err());
    }
}
