//! Shared Cache Module
//!
//! Locking mode for [`Cache`]: one coarse mutex held for the whole body of
//! every call. Readers and writers are not distinguished.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cache::{Cache, CacheStats};
use crate::error::Result;

// == Shared Cache ==
/// Clonable, thread-safe handle to a [`Cache`].
#[derive(Debug, Clone)]
pub struct SharedCache {
    inner: Arc<Mutex<Cache>>,
}

impl SharedCache {
    pub fn new(cache: Cache) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    /// Every operation locks through here.
    ///
    /// A poisoned lock is recovered: no operation panics between mutating
    /// the chains and restoring their invariants.
    fn lock(&self) -> MutexGuard<'_, Cache> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` with exclusive access to the cache, for batching several
    /// operations under one lock acquisition.
    pub fn with<T>(&self, f: impl FnOnce(&mut Cache) -> T) -> T {
        f(&mut self.lock())
    }

    // == Unshare ==
    /// Returns to unsynchronized mode if this is the last handle.
    ///
    /// Gives the handle back unchanged while other clones are alive.
    pub fn unshare(self) -> std::result::Result<Cache, SharedCache> {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => Ok(mutex.into_inner().unwrap_or_else(PoisonError::into_inner)),
            Err(inner) => Err(Self { inner }),
        }
    }

    pub fn sweep_interval_secs(&self) -> u64 {
        self.lock().sweep_interval_secs()
    }

    /// Always true.
    pub fn locking_enabled(&self) -> bool {
        true
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock().set(key, value)
    }

    pub fn set_binary(&self, key: &str, value: &[u8]) -> Result<()> {
        self.lock().set_binary(key, value)
    }

    pub fn set_with_ttl(
        &self,
        key: &str,
        value: impl AsRef<[u8]>,
        ttl_secs: u64,
    ) -> Result<()> {
        self.lock().set_with_ttl(key, value, ttl_secs)
    }

    pub fn get(&self, key: &str) -> Result<String> {
        self.lock().get(key)
    }

    pub fn get_binary(&self, key: &str) -> Result<Vec<u8>> {
        self.lock().get_binary(key)
    }

    pub fn read_into(&self, key: &str, buf: &mut [u8]) -> Result<usize> {
        self.lock().read_into(key, buf)
    }

    pub fn exists(&self, key: &str) -> bool {
        self.lock().exists(key)
    }

    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key)
    }

    pub fn expire(&self, key: &str, ttl_secs: u64) -> Result<()> {
        self.lock().expire(key, ttl_secs)
    }

    pub fn ttl(&self, key: &str) -> Option<u64> {
        self.lock().ttl(key)
    }

    pub fn touch(&self, key: &str) -> Result<u64> {
        self.lock().touch(key)
    }

    pub fn evict_expired(&self) -> usize {
        self.lock().evict_expired()
    }

    pub fn clear(&self) {
        self.lock().clear()
    }

    pub fn count(&self) -> usize {
        self.lock().count()
    }

    pub fn memory_usage(&self) -> usize {
        self.lock().memory_usage()
    }

    pub fn stats(&self) -> CacheStats {
        self.lock().stats()
    }

    /// Visits every entry while holding the lock.
    pub fn iterate<F>(&self, f: F)
    where
        F: FnMut(&str, &[u8]),
    {
        self.lock().iterate(f)
    }

    pub fn keys(&self) -> Vec<String> {
        self.lock().keys()
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<usize> {
        self.lock().save(path)
    }

    pub fn load(&self, path: impl AsRef<Path>) -> Result<usize> {
        self.lock().load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_threadsafe_roundtrip() {
        let shared = Cache::new(0).unwrap().threadsafe();
        assert!(shared.locking_enabled());

        shared.set("k", "v").unwrap();
        assert_eq!(shared.get("k").unwrap(), "v");

        let cache = shared.unshare().unwrap();
        assert!(!cache.locking_enabled());
        assert_eq!(cache.count(), 1);
    }

    #[test]
    fn test_unshare_fails_with_live_clones() {
        let shared = Cache::new(0).unwrap().threadsafe();
        let other = shared.clone();

        let shared = shared.unshare().unwrap_err();
        drop(other);
        assert!(shared.unshare().is_ok());
    }

    #[test]
    fn test_concurrent_writers() {
        let shared = Cache::new(0).unwrap().threadsafe();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = shared.clone();
                thread::spawn(move || {
                    for i in 0..100 {
                        let key = format!("t{}_k{}", t, i);
                        cache.set(&key, &i.to_string()).unwrap();
                        assert!(cache.exists(&key));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.count(), 800);
        let stats = shared.stats();
        assert_eq!(stats.hits, 800);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_concurrent_capacity_limit() {
        let shared = Cache::new(50).unwrap().threadsafe();

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = shared.clone();
                thread::spawn(move || {
                    (0..40)
                        .filter(|i| cache.set(&format!("t{}_{}", t, i), "v").is_ok())
                        .count()
                })
            })
            .collect();

        let inserted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(inserted, 50);
        assert_eq!(shared.count(), 50);
    }

    #[test]
    fn test_with_batches_under_one_lock() {
        let shared = Cache::new(0).unwrap().threadsafe();
        let total = shared.with(|cache| {
            cache.set("a", "1").unwrap();
            cache.set("b", "2").unwrap();
            cache.count()
        });
        assert_eq!(total, 2);
    }
}
