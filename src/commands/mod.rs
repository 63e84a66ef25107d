//! Command execution module
//!
//! Provides a unified interface for all commands through the Command trait.
//! Each command family is implemented in a separate file for high cohesion.

mod context;
mod registry;

// Command implementations
mod string;
mod counter;
mod bitmap;
mod hash;
mod list;
mod set;
mod zset;
mod key;
mod ttl;
mod search;
mod admin;
mod connection;

pub use context::CommandContext;
pub use registry::CommandRegistry;

use crate::error::{CacheError, Result};
use crate::protocol::{parse_float, Arg, Reply};
use bytes::Bytes;

/// Command execution trait
///
/// All commands implement this trait with a single execute method.
/// This provides loose coupling between command implementations and the dispatcher.
pub trait Command: Send + Sync {
    /// Execute the command with the given context and arguments
    ///
    /// Arguments:
    /// - ctx: mutable reference to the command context (keyspace, clock, rng)
    /// - args: command arguments (excluding the command name itself)
    ///
    /// Returns:
    /// - the reply, or the error that ends the call
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply>;

    /// Get the command name (for debugging/logging)
    fn name(&self) -> &'static str;

    /// Get the minimum number of arguments required
    fn min_args(&self) -> usize {
        0
    }

    /// Get the maximum number of arguments (None = unlimited)
    fn max_args(&self) -> Option<usize> {
        None
    }
}

/// Extract a string argument; numbers are accepted in canonical form
pub(crate) fn extract_bytes(arg: &Arg) -> Result<Bytes> {
    arg.as_bytes()
        .ok_or_else(|| CacheError::syntax("expected a string argument"))
}

/// Extract every argument as a string
pub(crate) fn extract_all(args: &[Arg]) -> Result<Vec<Bytes>> {
    args.iter().map(extract_bytes).collect()
}

/// Extract an integer argument, parsing strings
pub(crate) fn extract_integer(arg: &Arg) -> Result<i64> {
    arg.as_integer().ok_or(CacheError::NotAnInteger)
}

/// Extract a float argument, parsing strings
pub(crate) fn extract_float(arg: &Arg) -> Result<f64> {
    arg.as_float().ok_or(CacheError::NotAFloat)
}

/// Case-insensitive match of an option keyword
pub(crate) fn is_keyword(arg: &Arg, keyword: &str) -> bool {
    match arg {
        Arg::Bulk(b) => b.eq_ignore_ascii_case(keyword.as_bytes()),
        _ => false,
    }
}

/// Parse a stored string as a signed 64-bit integer
pub(crate) fn parse_stored_integer(bytes: &[u8]) -> Result<i64> {
    std::str::from_utf8(bytes)
        .ok()
        .and_then(|s| s.parse::<i64>().ok())
        .ok_or(CacheError::NotAnInteger)
}

/// Parse a stored string as a float
pub(crate) fn parse_stored_float(bytes: &[u8]) -> Result<f64> {
    parse_float(bytes).ok_or(CacheError::NotAFloat)
}

/// Resolve an inclusive `[start, stop]` range with negative indices against
/// a sequence of `len` elements
///
/// Out-of-range ends are clamped; `None` means the range selects nothing.
pub(crate) fn normalize_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if len == 0 || start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}
