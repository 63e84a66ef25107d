//! memcache-rs - An in-process emulation of a Redis-style key-value store
//!
//! The engine runs synchronously inside the caller's process with no network
//! transport:
//! - Strings, hashes, lists, sets and sorted sets with the store's semantics
//! - Lazy TTL expiration against an injectable clock
//! - Multiple logical databases with select/swap/move/flush
//! - Portable dump/restore payloads
//! - MULTI/EXEC/DISCARD queueing
//!
//! ```
//! use memcache_rs::{args, Client, EngineConfig, Reply};
//!
//! let mut client = Client::new(&EngineConfig::default());
//! client.create_client();
//! client.call("hset", &args!["user:1", "name", "ada"]).unwrap();
//! assert_eq!(client.call("hget", &args!["user:1", "name"]).unwrap(), Reply::bulk("ada"));
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod protocol;
pub mod store;
pub mod commands;
pub mod dispatch;
pub mod client;

/// Re-export commonly used types
pub use client::{Client, ClientEvent};
pub use clock::{Clock, ManualClock, SystemClock};
pub use commands::{Command, CommandContext};
pub use config::EngineConfig;
pub use dispatch::Dispatcher;
pub use error::{CacheError, Result};
pub use protocol::{Arg, Reply};
pub use store::{Entry, Value};
