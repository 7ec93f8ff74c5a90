//! Bucket Table Module
//!
//! Fixed-size array of singly-linked collision chains. Chains live in an
//! arena of slots; bucket heads and `next` links are slot indices, and
//! freed slots are recycled through a free list.

use crate::cache::entry::CacheEntry;
use crate::cache::hash::bucket_index;
use crate::error::Result;

#[derive(Debug)]
struct Slot {
    entry: CacheEntry,
    next: Option<usize>,
}

/// Position of an entry in its chain, as found by [`BucketTable::locate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    bucket: usize,
    slot: usize,
    prev: Option<usize>,
}

// == Bucket Table ==
/// Hash table with a fixed number of buckets and separate chaining.
///
/// The bucket count never changes after construction, so every key keeps
/// its bucket for the lifetime of the table.
#[derive(Debug)]
pub struct BucketTable {
    heads: Vec<Option<usize>>,
    slots: Vec<Option<Slot>>,
    free: Vec<usize>,
    len: usize,
}

impl BucketTable {
    // == Constructor ==
    /// Allocates `bucket_count` empty chains.
    ///
    /// Fails only if the bucket array cannot be allocated.
    pub fn new(bucket_count: usize) -> Result<Self> {
        let mut heads = Vec::new();
        heads.try_reserve_exact(bucket_count)?;
        heads.resize(bucket_count, None);

        Ok(Self {
            heads,
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        })
    }

    pub fn bucket_count(&self) -> usize {
        self.heads.len()
    }

    /// Number of entries reachable from the bucket heads.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn slot(&self, index: usize) -> &Slot {
        match &self.slots[index] {
            Some(slot) => slot,
            None => unreachable!("chain link points at a free slot"),
        }
    }

    fn slot_mut(&mut self, index: usize) -> &mut Slot {
        match &mut self.slots[index] {
            Some(slot) => slot,
            None => unreachable!("chain link points at a free slot"),
        }
    }

    // == Locate ==
    /// Scans the key's chain, tracking the predecessor of the match.
    pub fn locate(&self, key: &str) -> Option<Position> {
        let bucket = bucket_index(key.as_bytes(), self.heads.len());
        let mut prev = None;
        let mut cursor = self.heads[bucket];

        while let Some(index) = cursor {
            let slot = self.slot(index);
            if slot.entry.key == key {
                return Some(Position {
                    bucket,
                    slot: index,
                    prev,
                });
            }
            prev = Some(index);
            cursor = slot.next;
        }
        None
    }

    pub fn entry(&self, pos: Position) -> &CacheEntry {
        &self.slot(pos.slot).entry
    }

    pub fn entry_mut(&mut self, pos: Position) -> &mut CacheEntry {
        &mut self.slot_mut(pos.slot).entry
    }

    // == Insert ==
    /// Links a new entry at the head of its bucket's chain.
    ///
    /// The caller guarantees the key is not already present.
    pub fn insert(&mut self, entry: CacheEntry) -> Result<Position> {
        let bucket = bucket_index(entry.key.as_bytes(), self.heads.len());
        let slot = Slot {
            entry,
            next: self.heads[bucket],
        };

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index] = Some(slot);
                index
            }
            None => {
                self.slots.try_reserve(1)?;
                self.slots.push(Some(slot));
                self.slots.len() - 1
            }
        };

        self.heads[bucket] = Some(index);
        self.len += 1;
        Ok(Position {
            bucket,
            slot: index,
            prev: None,
        })
    }

    // == Unlink ==
    /// Unlinks the entry at `pos` and hands it back to the caller.
    pub fn unlink(&mut self, pos: Position) -> CacheEntry {
        let slot = match self.slots[pos.slot].take() {
            Some(slot) => slot,
            None => unreachable!("unlinking a free slot"),
        };

        match pos.prev {
            Some(prev) => self.slot_mut(prev).next = slot.next,
            None => self.heads[pos.bucket] = slot.next,
        }

        self.free.push(pos.slot);
        self.len -= 1;
        slot.entry
    }

    // == Remove ==
    /// Unlinks the entry for `key`, if any.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        self.locate(key).map(|pos| self.unlink(pos))
    }

    // == Retain ==
    /// Walks every chain and unlinks each entry for which `keep` is false.
    ///
    /// Returns the number of entries removed.
    pub fn retain<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&CacheEntry) -> bool,
    {
        let mut removed = 0;

        for bucket in 0..self.heads.len() {
            let mut prev = None;
            let mut cursor = self.heads[bucket];

            while let Some(index) = cursor {
                let next = self.slot(index).next;
                if keep(&self.slot(index).entry) {
                    prev = Some(index);
                } else {
                    self.unlink(Position {
                        bucket,
                        slot: index,
                        prev,
                    });
                    removed += 1;
                }
                cursor = next;
            }
        }

        removed
    }

    // == Clear ==
    /// Drops every entry; the bucket array keeps its size.
    pub fn clear(&mut self) {
        self.heads.iter_mut().for_each(|head| *head = None);
        self.slots.clear();
        self.free.clear();
        self.len = 0;
    }

    // == Iter ==
    /// Iterates bucket by bucket, each chain from head to tail.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            table: self,
            bucket: 0,
            cursor: None,
        }
    }
}

/// Iterator over the entries of a [`BucketTable`].
pub struct Iter<'a> {
    table: &'a BucketTable,
    bucket: usize,
    cursor: Option<usize>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a CacheEntry;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(index) = self.cursor {
                let slot = self.table.slot(index);
                self.cursor = slot.next;
                return Some(&slot.entry);
            }
            if self.bucket >= self.table.heads.len() {
                return None;
            }
            self.cursor = self.table.heads[self.bucket];
            self.bucket += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str) -> CacheEntry {
        CacheEntry::new(key.to_string(), key.as_bytes().to_vec())
    }

    #[test]
    fn test_table_new() {
        let table = BucketTable::new(16).unwrap();
        assert_eq!(table.bucket_count(), 16);
        assert!(table.is_empty());
        assert_eq!(table.iter().count(), 0);
    }

    #[test]
    fn test_insert_and_locate() {
        let mut table = BucketTable::new(16).unwrap();
        table.insert(entry("a")).unwrap();
        table.insert(entry("b")).unwrap();

        let pos = table.locate("a").unwrap();
        assert_eq!(table.entry(pos).value, b"a");
        assert!(table.locate("c").is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_single_bucket_chain_order() {
        // One bucket forces every key into the same chain
        let mut table = BucketTable::new(1).unwrap();
        table.insert(entry("first")).unwrap();
        table.insert(entry("second")).unwrap();
        table.insert(entry("third")).unwrap();

        let keys: Vec<&str> = table.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["third", "second", "first"]);
    }

    #[test]
    fn test_unlink_middle_of_chain() {
        let mut table = BucketTable::new(1).unwrap();
        table.insert(entry("a")).unwrap();
        table.insert(entry("b")).unwrap();
        table.insert(entry("c")).unwrap();

        let removed = table.remove("b").unwrap();
        assert_eq!(removed.key, "b");

        let keys: Vec<&str> = table.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["c", "a"]);
        assert_eq!(table.len(), 2);
        assert!(table.remove("b").is_none());
    }

    #[test]
    fn test_slots_are_recycled() {
        let mut table = BucketTable::new(4).unwrap();
        for round in 0..10 {
            let key = format!("k{}", round);
            table.insert(entry(&key)).unwrap();
            table.remove(&key).unwrap();
        }
        assert_eq!(table.slots.len(), 1);
        assert!(table.is_empty());
    }

    #[test]
    fn test_retain() {
        let mut table = BucketTable::new(2).unwrap();
        for i in 0..10 {
            table.insert(entry(&format!("k{}", i))).unwrap();
        }

        let removed = table.retain(|e| e.key != "k3" && e.key != "k7");
        assert_eq!(removed, 2);
        assert_eq!(table.len(), 8);
        assert!(table.locate("k3").is_none());
        assert!(table.locate("k7").is_none());
        assert!(table.locate("k5").is_some());
        assert_eq!(table.iter().count(), 8);
    }

    #[test]
    fn test_clear() {
        let mut table = BucketTable::new(8).unwrap();
        table.insert(entry("a")).unwrap();
        table.insert(entry("b")).unwrap();

        table.clear();
        assert!(table.is_empty());
        assert!(table.locate("a").is_none());
        assert_eq!(table.bucket_count(), 8);
    }
}
