//! DUMP / RESTORE payload format
//!
//! JSON document: `{"version":1,"ttl":<ms|null>,"value":{"type":..,"data":..}}`.
//! Byte strings are base64 so binary values survive the round trip; scores
//! are written as canonical float strings so infinities survive too.

use super::entry::Entry;
use super::value::{Hash, List, Set, Value};
use super::zset::SortedSet;
use crate::error::{CacheError, Result};
use crate::protocol::{format_float, parse_float};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Current payload version
const DUMP_VERSION: u8 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct DumpPayload {
    version: u8,
    ttl: Option<u64>,
    value: DumpValue,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
enum DumpValue {
    String(String),
    List(Vec<String>),
    Set(Vec<String>),
    Hash(Vec<(String, String)>),
    Zset(Vec<(String, String)>),
}

/// A decoded payload
#[derive(Debug, Clone, PartialEq)]
pub struct Restored {
    pub value: Value,
    /// Remaining TTL at dump time, milliseconds
    pub ttl: Option<u64>,
}

fn b64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

fn unb64(text: &str) -> Result<Bytes> {
    STANDARD
        .decode(text)
        .map(Bytes::from)
        .map_err(|_| CacheError::BadPayload)
}

/// Serialize an entry; the remaining TTL is taken at `now`
pub fn encode(entry: &Entry, now: u64) -> Result<String> {
    let value = match &entry.value {
        Value::String(b) => DumpValue::String(b64(b)),
        Value::List(list) => DumpValue::List(list.iter().map(|b| b64(b)).collect()),
        Value::Set(set) => {
            let mut members: Vec<String> = set.iter().map(|b| b64(b)).collect();
            members.sort();
            DumpValue::Set(members)
        }
        Value::Hash(hash) => {
            let mut pairs: Vec<(String, String)> =
                hash.iter().map(|(f, v)| (b64(f), b64(v))).collect();
            pairs.sort();
            DumpValue::Hash(pairs)
        }
        Value::ZSet(zset) => DumpValue::Zset(
            zset.sorted()
                .into_iter()
                .map(|(m, s)| (b64(&m), format_float(s)))
                .collect(),
        ),
    };

    let payload = DumpPayload {
        version: DUMP_VERSION,
        ttl: entry.remaining_ms(now),
        value,
    };
    serde_json::to_string(&payload).map_err(|_| CacheError::BadPayload)
}

/// Parse a payload produced by `encode`
pub fn decode(payload: &[u8]) -> Result<Restored> {
    let payload: DumpPayload =
        serde_json::from_slice(payload).map_err(|_| CacheError::BadPayload)?;
    if payload.version != DUMP_VERSION {
        return Err(CacheError::BadPayload);
    }

    let value = match payload.value {
        DumpValue::String(s) => Value::String(unb64(&s)?),
        DumpValue::List(items) => Value::List(
            items
                .iter()
                .map(|s| unb64(s))
                .collect::<Result<List>>()?,
        ),
        DumpValue::Set(items) => Value::Set(
            items
                .iter()
                .map(|s| unb64(s))
                .collect::<Result<Set>>()?,
        ),
        DumpValue::Hash(pairs) => Value::Hash(
            pairs
                .iter()
                .map(|(f, v)| Ok((unb64(f)?, unb64(v)?)))
                .collect::<Result<Hash>>()?,
        ),
        DumpValue::Zset(pairs) => {
            let mut zset = SortedSet::new();
            for (member, score) in pairs {
                let score = parse_float(score.as_bytes()).ok_or(CacheError::BadPayload)?;
                zset.insert(unb64(&member)?, score);
            }
            Value::ZSet(zset)
        }
    };
    if value.is_empty_collection() {
        return Err(CacheError::BadPayload);
    }

    Ok(Restored {
        value,
        ttl: payload.ttl,
    })
}
