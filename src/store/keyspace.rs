//! Multi-database manager
//!
//! Owns the numbered databases and the current index. The index is engine
//! state, so independent engines in one process never see each other.

use super::database::Database;
use crate::error::{CacheError, Result};
use bytes::Bytes;
use tracing::info;

/// Number of databases when nothing else is configured
pub const DEFAULT_DATABASES: usize = 16;

/// All databases of one engine plus the selected index
#[derive(Debug, Clone)]
pub struct Keyspace {
    databases: Vec<Database>,
    current: usize,
}

impl Keyspace {
    /// Create `count` empty databases (at least one) with index 0 selected
    pub fn new(count: usize) -> Self {
        Keyspace {
            databases: (0..count.max(1)).map(|_| Database::new()).collect(),
            current: 0,
        }
    }

    /// Number of databases
    pub fn len(&self) -> usize {
        self.databases.len()
    }

    /// Always false; a keyspace has at least one database
    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Index of the selected database
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The selected database
    pub fn current(&mut self) -> &mut Database {
        &mut self.databases[self.current]
    }

    /// A database by index
    pub fn db(&self, index: usize) -> Option<&Database> {
        self.databases.get(index)
    }

    /// A database by index, mutably
    pub fn db_mut(&mut self, index: usize) -> Option<&mut Database> {
        self.databases.get_mut(index)
    }

    /// Check that `index` names a database
    pub fn validate(&self, index: i64) -> Result<usize> {
        usize::try_from(index)
            .ok()
            .filter(|i| *i < self.databases.len())
            .ok_or(CacheError::InvalidDbIndex)
    }

    /// Change the selected database
    pub fn select(&mut self, index: i64) -> Result<()> {
        self.current = self.validate(index)?;
        info!("Selected database {}", self.current);
        Ok(())
    }

    /// Exchange the full contents of two databases
    pub fn swap(&mut self, a: i64, b: i64) -> Result<()> {
        let a = self.validate(a)?;
        let b = self.validate(b)?;
        self.databases.swap(a, b);
        info!("Swapped databases {} and {}", a, b);
        Ok(())
    }

    /// Clear every database and select index 0
    pub fn flush_all(&mut self) {
        for db in &mut self.databases {
            db.clear();
        }
        self.current = 0;
        info!("Flushed all {} databases", self.databases.len());
    }

    /// Move a key from the selected database to `target`
    ///
    /// Returns false when the key is absent or the target already holds it.
    pub fn move_key(&mut self, key: &Bytes, target: usize, now: u64) -> Result<bool> {
        if target == self.current {
            return Err(CacheError::syntax("source and destination objects are the same"));
        }
        let target_has_key = self
            .databases
            .get_mut(target)
            .ok_or(CacheError::InvalidDbIndex)?
            .contains(key, now);
        if target_has_key {
            return Ok(false);
        }

        match self.current().remove(key, now) {
            Some(entry) => {
                self.databases[target].insert_entry(key.clone(), entry);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl Default for Keyspace {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Value;

    #[test]
    fn test_select_validates_range() {
        let mut ks = Keyspace::new(4);
        assert!(ks.select(3).is_ok());
        assert_eq!(ks.current_index(), 3);
        assert_eq!(ks.select(4), Err(CacheError::InvalidDbIndex));
        assert_eq!(ks.select(-1), Err(CacheError::InvalidDbIndex));
        assert_eq!(ks.current_index(), 3);
    }

    #[test]
    fn test_databases_are_isolated() {
        let mut ks = Keyspace::default();
        ks.current().set(Bytes::from("k"), Value::string("v"), 0);
        ks.select(5).unwrap();
        assert!(!ks.current().contains(b"k", 0));
        ks.select(0).unwrap();
        assert!(ks.current().contains(b"k", 0));
    }

    #[test]
    fn test_swap() {
        let mut ks = Keyspace::default();
        ks.current().set(Bytes::from("k"), Value::string("v"), 0);
        ks.swap(0, 2).unwrap();
        assert!(ks.current().is_empty());
        assert_eq!(ks.db(2).map(|db| db.len()), Some(1));
        assert_eq!(ks.swap(0, 99), Err(CacheError::InvalidDbIndex));
    }

    #[test]
    fn test_flush_all_resets_index() {
        let mut ks = Keyspace::default();
        ks.select(1).unwrap();
        ks.current().set(Bytes::from("a"), Value::string("b"), 0);
        ks.flush_all();
        assert_eq!(ks.current_index(), 0);
        assert!(ks.db(1).unwrap().is_empty());
    }

    #[test]
    fn test_move_key() {
        let mut ks = Keyspace::default();
        let key = Bytes::from("k");
        assert_eq!(ks.move_key(&key, 1, 0), Ok(false));

        ks.current().set(key.clone(), Value::string("v"), 0);
        assert_eq!(ks.move_key(&key, 1, 0), Ok(true));
        assert!(!ks.current().contains(&key, 0));

        // Target already holds the key
        ks.current().set(key.clone(), Value::string("w"), 0);
        assert_eq!(ks.move_key(&key, 1, 0), Ok(false));
        assert!(ks.current().contains(&key, 0));
    }
}
