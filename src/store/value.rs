//! Value types for the key-value store

use super::zset::SortedSet;
use crate::error::{CacheError, Result};
use bytes::Bytes;
use std::collections::{HashMap, HashSet, VecDeque};

/// Ordered sequence of strings
pub type List = VecDeque<Bytes>;

/// Unordered set of unique strings
pub type Set = HashSet<Bytes>;

/// Field -> value mapping
pub type Hash = HashMap<Bytes, Bytes>;

/// The kind of value held by a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    List,
    Set,
    Hash,
    ZSet,
}

impl ValueKind {
    /// Name reported by TYPE
    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::List => "list",
            ValueKind::Set => "set",
            ValueKind::Hash => "hash",
            ValueKind::ZSet => "zset",
        }
    }
}

/// Represents the different types of values that can be stored
///
/// The tag is fixed for the lifetime of a key; nothing converts between
/// variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// String value (binary-safe)
    String(Bytes),

    /// List of values (ordered)
    List(List),

    /// Set of unique values (unordered)
    Set(Set),

    /// Hash map (field -> value)
    Hash(Hash),

    /// Members ordered by score
    ZSet(SortedSet),
}

impl Value {
    /// Create a string value
    pub fn string(bytes: impl Into<Bytes>) -> Self {
        Value::String(bytes.into())
    }

    /// The kind of this value
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::String(_) => ValueKind::String,
            Value::List(_) => ValueKind::List,
            Value::Set(_) => ValueKind::Set,
            Value::Hash(_) => ValueKind::Hash,
            Value::ZSet(_) => ValueKind::ZSet,
        }
    }

    /// Get the type name as a string
    pub fn type_name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// True for a collection with no elements left
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::String(_) => false,
            Value::List(list) => list.is_empty(),
            Value::Set(set) => set.is_empty(),
            Value::Hash(hash) => hash.is_empty(),
            Value::ZSet(zset) => zset.is_empty(),
        }
    }

    /// Borrow as `T`, failing with WrongType for any other kind
    pub fn expect<T: Typed>(&self) -> Result<&T> {
        T::from_value(self).ok_or(CacheError::WrongType)
    }

    /// Mutably borrow as `T`, failing with WrongType for any other kind
    pub fn expect_mut<T: Typed>(&mut self) -> Result<&mut T> {
        T::from_value_mut(self).ok_or(CacheError::WrongType)
    }

    /// Calculate approximate memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        match self {
            Value::String(bytes) => bytes.len(),
            Value::List(list) => {
                list.iter().map(|b| b.len()).sum::<usize>() + std::mem::size_of::<List>()
            }
            Value::Set(set) => {
                set.iter().map(|b| b.len()).sum::<usize>() + std::mem::size_of::<Set>()
            }
            Value::Hash(hash) => {
                hash.iter().map(|(k, v)| k.len() + v.len()).sum::<usize>()
                    + std::mem::size_of::<Hash>()
            }
            Value::ZSet(zset) => zset.memory_usage(),
        }
    }
}

/// A concrete payload type stored under one `Value` variant
///
/// This is the single place where a command's expected kind is matched
/// against what a key actually holds.
pub trait Typed: Default + Sized {
    /// The kind this payload belongs to
    const KIND: ValueKind;

    fn from_value(value: &Value) -> Option<&Self>;

    fn from_value_mut(value: &mut Value) -> Option<&mut Self>;

    fn into_value(self) -> Value;
}

impl Typed for Bytes {
    const KIND: ValueKind = ValueKind::String;

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::String(b) => Some(b),
            _ => None,
        }
    }

    fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::String(b) => Some(b),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl Typed for List {
    const KIND: ValueKind = ValueKind::List;

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::List(list) => Some(list),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::List(self)
    }
}

impl Typed for Set {
    const KIND: ValueKind = ValueKind::Set;

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::Set(set) => Some(set),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Set(self)
    }
}

impl Typed for Hash {
    const KIND: ValueKind = ValueKind::Hash;

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::Hash(hash) => Some(hash),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::Hash(self)
    }
}

impl Typed for SortedSet {
    const KIND: ValueKind = ValueKind::ZSet;

    fn from_value(value: &Value) -> Option<&Self> {
        match value {
            Value::ZSet(zset) => Some(zset),
            _ => None,
        }
    }

    fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
        match value {
            Value::ZSet(zset) => Some(zset),
            _ => None,
        }
    }

    fn into_value(self) -> Value {
        Value::ZSet(self)
    }
}
