//! One logical database
//!
//! Every lookup checks the entry's deadline first and physically removes an
//! expired key before anything observes it.

use super::entry::Entry;
use super::value::Value;
use bytes::Bytes;
use rand::seq::IteratorRandom;
use rand::Rng;
use siphasher::sip::SipHasher13;
use std::collections::HashMap;
use std::hash::BuildHasherDefault;

/// Type alias for our hash map with SipHasher
type StoreMap = HashMap<Bytes, Entry, BuildHasherDefault<SipHasher13>>;

/// Keyspace of a single database index
#[derive(Debug, Clone, Default)]
pub struct Database {
    entries: StoreMap,
}

impl Database {
    /// Create a new database with default capacity
    pub fn new() -> Self {
        Self::with_capacity(64)
    }

    /// Create a new database with specified initial capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Database {
            entries: HashMap::with_capacity_and_hasher(
                capacity,
                BuildHasherDefault::<SipHasher13>::default(),
            ),
        }
    }

    /// Drop the key if its deadline has passed. Returns true if it was removed.
    fn expire_if_due(&mut self, key: &[u8], now: u64) -> bool {
        let expired = self
            .entries
            .get(key)
            .map(|entry| entry.is_expired(now))
            .unwrap_or(false);

        if expired {
            self.entries.remove(key);
        }
        expired
    }

    /// Get a value, refreshing its access time
    pub fn get(&mut self, key: &[u8], now: u64) -> Option<&Value> {
        self.get_mut(key, now).map(|value| &*value)
    }

    /// Get a mutable value, refreshing its access time
    pub fn get_mut(&mut self, key: &[u8], now: u64) -> Option<&mut Value> {
        self.expire_if_due(key, now);
        self.entries.get_mut(key).map(|entry| {
            entry.touch(now);
            &mut entry.value
        })
    }

    /// Get a value, creating it with `make` when the key is absent
    pub fn get_or_insert_with(
        &mut self,
        key: &Bytes,
        now: u64,
        make: impl FnOnce() -> Value,
    ) -> &mut Value {
        self.expire_if_due(key, now);
        let entry = self
            .entries
            .entry(key.clone())
            .or_insert_with(|| Entry::new(make(), now));
        entry.touch(now);
        &mut entry.value
    }

    /// Get the live entry without touching it (TTL, TYPE, DUMP)
    pub fn entry(&mut self, key: &[u8], now: u64) -> Option<&Entry> {
        self.expire_if_due(key, now);
        self.entries.get(key)
    }

    /// Get the live entry mutably without touching it
    pub fn entry_mut(&mut self, key: &[u8], now: u64) -> Option<&mut Entry> {
        self.expire_if_due(key, now);
        self.entries.get_mut(key)
    }

    /// Raw view of an entry, ignoring expiry
    pub fn peek(&self, key: &[u8]) -> Option<&Entry> {
        self.entries.get(key)
    }

    /// Store a value under `key`, discarding any previous entry and its TTL
    pub fn set(&mut self, key: Bytes, value: Value, now: u64) {
        self.entries.insert(key, Entry::new(value, now));
    }

    /// Store a complete entry (RENAME, MOVE, RESTORE)
    pub fn insert_entry(&mut self, key: Bytes, entry: Entry) {
        self.entries.insert(key, entry);
    }

    /// Remove a live key, returning its entry
    pub fn remove(&mut self, key: &[u8], now: u64) -> Option<Entry> {
        if self.expire_if_due(key, now) {
            return None;
        }
        self.entries.remove(key)
    }

    /// Check if a key exists (and is not expired)
    pub fn contains(&mut self, key: &[u8], now: u64) -> bool {
        self.expire_if_due(key, now);
        self.entries.contains_key(key)
    }

    /// Delete the key if it holds a collection with no elements left
    pub fn remove_if_empty(&mut self, key: &[u8]) -> bool {
        let empty = self
            .entries
            .get(key)
            .map(|entry| entry.value.is_empty_collection())
            .unwrap_or(false);

        if empty {
            self.entries.remove(key);
        }
        empty
    }

    /// All live keys
    pub fn keys(&self, now: u64) -> Vec<Bytes> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// One live key chosen uniformly at random
    pub fn random_key<R: Rng + ?Sized>(&self, now: u64, rng: &mut R) -> Option<Bytes> {
        self.entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .choose(rng)
    }

    /// Remove every expired entry (proactive sweep)
    /// Returns the number of keys removed
    pub fn purge_expired(&mut self, now: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    /// Remove all keys
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet reclaimed
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the database holds no entries at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get statistics about the database
    pub fn stats(&self, now: u64) -> DatabaseStats {
        let active: Vec<&Entry> = self
            .entries
            .values()
            .filter(|entry| !entry.is_expired(now))
            .collect();

        DatabaseStats {
            total_keys: self.entries.len(),
            active_keys: active.len(),
            volatile_keys: active.iter().filter(|e| e.expire_at.is_some()).count(),
            used_memory_bytes: active
                .iter()
                .map(|e| e.memory_usage())
                .sum::<usize>()
                + self.entries.keys().map(|k| k.len()).sum::<usize>(),
        }
    }
}

/// Statistics about one database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseStats {
    pub total_keys: usize,
    pub active_keys: usize,
    pub volatile_keys: usize,
    pub used_memory_bytes: usize,
}
