//! Error type for the engine
//!
//! Every user-visible failure is a `CacheError`. Negative business outcomes
//! (missing member, nothing to pop, absent key on a query) are never errors.

use thiserror::Error;

/// Result type alias using CacheError
pub type Result<T> = std::result::Result<T, CacheError>;

/// Unified error type for all command failures
///
/// Messages follow the wording of the emulated store so callers that match
/// on text keep working.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    // -------------------------------------------------------------------------
    // Keyspace errors
    // -------------------------------------------------------------------------
    #[error("WRONGTYPE Operation against a key holding the wrong kind of value")]
    WrongType,

    #[error("ERR no such key")]
    NoSuchKey,

    #[error("BUSYKEY Target key name is busy.")]
    BusyKey,

    #[error("ERR invalid DB index")]
    InvalidDbIndex,

    // -------------------------------------------------------------------------
    // Argument errors
    // -------------------------------------------------------------------------
    #[error("ERR index out of range")]
    OutOfRange,

    #[error("ERR value is not an integer or out of range")]
    NotAnInteger,

    #[error("ERR value is not a valid float")]
    NotAFloat,

    #[error("ERR increment or decrement would overflow")]
    Overflow,

    #[error("ERR invalid expire time in '{0}' command")]
    InvalidExpire(String),

    #[error("ERR syntax error: {0}")]
    Syntax(String),

    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(String),

    // -------------------------------------------------------------------------
    // Serialization errors
    // -------------------------------------------------------------------------
    #[error("ERR DUMP payload version or checksum are wrong")]
    BadPayload,

    // -------------------------------------------------------------------------
    // Command table errors
    // -------------------------------------------------------------------------
    #[error("ERR command '{0}' is not supported by this engine")]
    UnsupportedCommand(String),

    #[error("ERR unknown command '{0}'")]
    UnknownCommand(String),

    // -------------------------------------------------------------------------
    // Transaction errors
    // -------------------------------------------------------------------------
    #[error("ERR MULTI calls can not be nested")]
    NestedMulti,

    #[error("ERR {0} without MULTI")]
    WithoutMulti(&'static str),

    #[error("EXECABORT Transaction discarded because of previous errors.")]
    ExecAbort,
}

impl CacheError {
    /// Shorthand for a syntax error with a message
    pub fn syntax(msg: impl Into<String>) -> Self {
        CacheError::Syntax(msg.into())
    }
}
