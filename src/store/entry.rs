//! Entry structure for key-value pairs

use super::value::Value;

/// Represents a single entry in the store
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// The value
    pub value: Value,

    /// Optional expiration deadline (milliseconds since epoch)
    pub expire_at: Option<u64>,

    /// Last read, write or touch (milliseconds since epoch)
    pub last_access: u64,
}

impl Entry {
    /// Create a new entry without expiration
    pub fn new(value: Value, now: u64) -> Self {
        Entry {
            value,
            expire_at: None,
            last_access: now,
        }
    }

    /// Create a new entry with an absolute deadline
    pub fn with_expire_at(value: Value, expire_at: Option<u64>, now: u64) -> Self {
        Entry {
            value,
            expire_at,
            last_access: now,
        }
    }

    /// Check if the entry has expired at `now`
    pub fn is_expired(&self, now: u64) -> bool {
        matches!(self.expire_at, Some(deadline) if now >= deadline)
    }

    /// Refresh the access timestamp
    pub fn touch(&mut self, now: u64) {
        self.last_access = now;
    }

    /// Remaining time to live in milliseconds, `None` without expiry
    pub fn remaining_ms(&self, now: u64) -> Option<u64> {
        self.expire_at.map(|deadline| deadline.saturating_sub(now))
    }

    /// Calculate approximate memory usage of this entry in bytes
    pub fn memory_usage(&self) -> usize {
        self.value.memory_usage() + std::mem::size_of::<Option<u64>>() + std::mem::size_of::<u64>()
    }
}
