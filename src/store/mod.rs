//! In-memory storage module
//!
//! Provides the core data structures for storing typed entries across
//! numbered databases. This module is independent of command handling.

mod entry;
mod value;
mod zset;
mod database;
mod keyspace;
pub mod dump;

pub use entry::Entry;
pub use value::{Hash, List, Set, Typed, Value, ValueKind};
pub use zset::{LexBound, LexRange, ScoreBound, ScoreRange, SortedSet};
pub use database::{Database, DatabaseStats};
pub use keyspace::{Keyspace, DEFAULT_DATABASES};
