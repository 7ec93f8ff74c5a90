//! Cache Store Module
//!
//! Main cache engine: TTL-aware entry store over the bucket table, plus the
//! public operations. `Cache` is unsynchronized; wrap it with
//! [`Cache::threadsafe`] to share it between threads.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use tracing::{debug, info, trace};

use crate::cache::entry::{current_timestamp_ms, CacheEntry};
use crate::cache::snapshot::{read_snapshot, write_snapshot};
use crate::cache::table::{BucketTable, Position};
use crate::cache::{CacheStats, SharedCache};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Cache ==
/// In-process key/value cache with TTL support.
///
/// Lookups (`get`, `get_binary`, `read_into`, `exists`, `ttl`, `expire`,
/// `touch`) each record exactly one hit or miss, and evict the key on the
/// spot if its TTL has elapsed.
#[derive(Debug)]
pub struct Cache {
    table: BucketTable,
    /// Maximum number of entries allowed (0 = unlimited)
    max_entries: usize,
    /// Interval in seconds used by the background sweeper
    sweep_interval_secs: u64,
    stats: CacheStats,
}

impl Cache {
    // == Constructor ==
    /// Creates a cache with the default bucket count.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries (0 = unlimited)
    pub fn new(max_entries: usize) -> Result<Self> {
        Self::with_config(CacheConfig::new(max_entries))
    }

    /// Creates a cache from a full configuration.
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        if config.bucket_count == 0 {
            return Err(CacheError::InvalidConfig(
                "bucket_count must be at least 1".to_string(),
            ));
        }

        let table = BucketTable::new(config.bucket_count)?;
        debug!(
            buckets = config.bucket_count,
            max_entries = config.max_entries,
            "cache initialized"
        );

        Ok(Self {
            table,
            max_entries: config.max_entries,
            sweep_interval_secs: config.sweep_interval_secs,
            stats: CacheStats::new(),
        })
    }

    // == Shutdown ==
    /// Releases every entry and the bucket array.
    pub fn shutdown(self) {
        debug!(entries = self.table.len(), "cache shut down");
    }

    // == Threadsafe ==
    /// Switches to locking mode: every call on the returned handle runs
    /// under one mutex.
    pub fn threadsafe(self) -> SharedCache {
        SharedCache::new(self)
    }

    /// Always false; see [`SharedCache::locking_enabled`].
    pub fn locking_enabled(&self) -> bool {
        false
    }

    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Seconds between runs of [`spawn_sweeper`](crate::tasks::spawn_sweeper).
    pub fn sweep_interval_secs(&self) -> u64 {
        self.sweep_interval_secs
    }

    // == Lookup ==
    /// Finds a live entry, evicting it instead if its TTL has elapsed.
    fn lookup(&mut self, key: &str, now: u64) -> Result<Position> {
        match self.table.locate(key) {
            Some(pos) if self.table.entry(pos).is_expired_at(now) => {
                self.table.unlink(pos);
                self.stats.record_miss();
                trace!(key, "evicted expired entry on access");
                Err(CacheError::Expired(key.to_string()))
            }
            Some(pos) => {
                self.stats.record_hit();
                Ok(pos)
            }
            None => {
                self.stats.record_miss();
                Err(CacheError::NotFound(key.to_string()))
            }
        }
    }

    // == Upsert ==
    /// Replaces the value of an existing key (clearing its TTL) or inserts
    /// a new entry if capacity allows.
    fn upsert(&mut self, key: &str, value: &[u8]) -> Result<Position> {
        if key.as_bytes().contains(&0) {
            return Err(CacheError::InvalidKey(
                "key must not contain a NUL byte".to_string(),
            ));
        }

        let value = copy_bytes(value)?;

        if let Some(pos) = self.table.locate(key) {
            let entry = self.table.entry_mut(pos);
            entry.value = value;
            entry.expires_at = None;
            return Ok(pos);
        }

        if self.max_entries != 0 && self.table.len() >= self.max_entries {
            debug!(key, max_entries = self.max_entries, "insert refused at capacity");
            return Err(CacheError::CapacityExceeded {
                max_entries: self.max_entries,
            });
        }

        let mut owned_key = String::new();
        owned_key.try_reserve_exact(key.len())?;
        owned_key.push_str(key);

        self.table.insert(CacheEntry::new(owned_key, value))
    }

    // == Set ==
    /// Stores a string value. Any TTL on the key is cleared.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.set_binary(key, value.as_bytes())
    }

    /// Stores a binary value. Any TTL on the key is cleared.
    pub fn set_binary(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.upsert(key, value).map(|_| ())
    }

    /// Stores a value that expires after `ttl_secs` seconds (0 = never).
    pub fn set_with_ttl(
        &mut self,
        key: &str,
        value: impl AsRef<[u8]>,
        ttl_secs: u64,
    ) -> Result<()> {
        let pos = self.upsert(key, value.as_ref())?;
        self.table
            .entry_mut(pos)
            .set_ttl(ttl_secs, current_timestamp_ms());
        Ok(())
    }

    // == Get ==
    /// Retrieves a value as a string, replacing invalid UTF-8 sequences.
    pub fn get(&mut self, key: &str) -> Result<String> {
        let pos = self.lookup(key, current_timestamp_ms())?;
        Ok(String::from_utf8_lossy(&self.table.entry(pos).value).into_owned())
    }

    /// Retrieves a copy of the raw value.
    pub fn get_binary(&mut self, key: &str) -> Result<Vec<u8>> {
        let pos = self.lookup(key, current_timestamp_ms())?;
        Ok(self.table.entry(pos).value.clone())
    }

    /// Copies the value into `buf`, truncating to `buf.len()`.
    ///
    /// Returns the full stored length, so a result larger than `buf.len()`
    /// signals truncation. On a miss `buf` is left untouched.
    pub fn read_into(&mut self, key: &str, buf: &mut [u8]) -> Result<usize> {
        let pos = self.lookup(key, current_timestamp_ms())?;
        let value = &self.table.entry(pos).value;
        let n = value.len().min(buf.len());
        buf[..n].copy_from_slice(&value[..n]);
        Ok(value.len())
    }

    // == Exists ==
    /// Checks for a live entry. Counts as a lookup.
    pub fn exists(&mut self, key: &str) -> bool {
        self.lookup(key, current_timestamp_ms()).is_ok()
    }

    // == Remove ==
    /// Removes a key. Returns true iff it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.table.remove(key).is_some()
    }

    // == Expire ==
    /// Sets a new TTL on an existing key; zero makes it persistent.
    pub fn expire(&mut self, key: &str, ttl_secs: u64) -> Result<()> {
        let now = current_timestamp_ms();
        let pos = self.lookup(key, now)?;
        self.table.entry_mut(pos).set_ttl(ttl_secs, now);
        Ok(())
    }

    // == TTL ==
    /// Remaining whole seconds (rounded up) before the key expires.
    ///
    /// `None` covers both "no TTL" and "no such key".
    pub fn ttl(&mut self, key: &str) -> Option<u64> {
        let now = current_timestamp_ms();
        let pos = self.lookup(key, now).ok()?;
        self.table.entry(pos).ttl_remaining_at(now)
    }

    // == Touch ==
    /// Re-stamps the key's remaining TTL from the current instant.
    ///
    /// The remaining duration is kept as is: touching does not restore the
    /// TTL the key was originally given. Returns the remaining seconds.
    pub fn touch(&mut self, key: &str) -> Result<u64> {
        let now = current_timestamp_ms();
        let pos = self.lookup(key, now)?;
        let entry = self.table.entry_mut(pos);
        let remaining = entry
            .ttl_remaining_ms_at(now)
            .ok_or_else(|| CacheError::NoTtl(key.to_string()))?;
        entry.expires_at = Some(now + remaining);
        Ok(remaining.div_ceil(1000))
    }

    // == Evict Expired ==
    /// Removes every expired entry. Returns the number removed.
    pub fn evict_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let removed = self.table.retain(|entry| !entry.is_expired_at(now));
        if removed > 0 {
            debug!(removed, "evicted expired entries");
        }
        removed
    }

    // == Clear ==
    /// Drops every entry. Hit and miss counters are kept.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    // == Count ==
    /// Number of stored entries, including expired ones not yet evicted.
    pub fn count(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    // == Memory Usage ==
    /// Approximate bytes held by all entries.
    pub fn memory_usage(&self) -> usize {
        self.table.iter().map(CacheEntry::footprint).sum()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.table.len(),
            ..self.stats
        }
    }

    // == Iterate ==
    /// Calls `f` for every stored entry, without checking TTLs.
    pub fn iterate<F>(&self, mut f: F)
    where
        F: FnMut(&str, &[u8]),
    {
        for entry in self.table.iter() {
            f(&entry.key, &entry.value);
        }
    }

    /// Iterates `(key, value)` pairs in bucket order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[u8])> + '_ {
        self.table
            .iter()
            .map(|entry| (entry.key.as_str(), entry.value.as_slice()))
    }

    pub fn keys(&self) -> Vec<String> {
        self.table.iter().map(|entry| entry.key.clone()).collect()
    }

    // == Save ==
    /// Writes every entry to `path`, truncating any existing file.
    ///
    /// TTLs are not written. Returns the number of entries saved.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        let written = write_snapshot(self, &mut writer)?;
        writer.flush()?;
        info!(path = %path.display(), entries = written, "snapshot saved");
        Ok(written)
    }

    // == Load ==
    /// Replaces the contents of the cache with the snapshot at `path`.
    ///
    /// The cache is cleared only once the file has been opened. Loaded
    /// entries have no TTL. Returns the number of entries restored.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let file = File::open(path)?;
        self.clear();
        let loaded = read_snapshot(self, BufReader::new(file))?;
        info!(path = %path.display(), entries = loaded, "snapshot loaded");
        Ok(loaded)
    }
}

fn copy_bytes(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(bytes.len())?;
    buf.extend_from_slice(bytes);
    Ok(buf)
}
