//! Counter commands (INCR, INCRBY, DECR, DECRBY, INCRBYFLOAT)

use super::{extract_bytes, extract_float, extract_integer, parse_stored_float, parse_stored_integer};
use super::{Command, CommandContext};
use crate::error::{CacheError, Result};
use crate::protocol::{format_float, Arg, Reply};
use bytes::Bytes;

/// Add `delta` to the integer stored at `key` (0 if absent), keeping its TTL
fn increment_by(ctx: &mut CommandContext, key: &Bytes, delta: i64) -> Result<i64> {
    let current = match ctx.read::<Bytes>(key)? {
        Some(value) => parse_stored_integer(value)?,
        None => 0,
    };
    let next = current.checked_add(delta).ok_or(CacheError::Overflow)?;
    *ctx.get_or_create::<Bytes>(key)? = Bytes::from(next.to_string());
    Ok(next)
}

/// INCR command - Increment the integer value of a key by one
///
/// Syntax: INCR key
pub struct IncrCommand;

impl Command for IncrCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        increment_by(ctx, &key, 1).map(Reply::integer)
    }

    fn name(&self) -> &'static str {
        "INCR"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// INCRBY command - Increment the integer value of a key by the given amount
///
/// Syntax: INCRBY key increment
pub struct IncrByCommand;

impl Command for IncrByCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let delta = extract_integer(&args[1])?;
        increment_by(ctx, &key, delta).map(Reply::integer)
    }

    fn name(&self) -> &'static str {
        "INCRBY"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// DECR command - Decrement the integer value of a key by one
///
/// Syntax: DECR key
pub struct DecrCommand;

impl Command for DecrCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        increment_by(ctx, &key, -1).map(Reply::integer)
    }

    fn name(&self) -> &'static str {
        "DECR"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// DECRBY command - Decrement the integer value of a key by the given amount
///
/// Syntax: DECRBY key decrement
pub struct DecrByCommand;

impl Command for DecrByCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let delta = extract_integer(&args[1])?
            .checked_neg()
            .ok_or(CacheError::Overflow)?;
        increment_by(ctx, &key, delta).map(Reply::integer)
    }

    fn name(&self) -> &'static str {
        "DECRBY"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// INCRBYFLOAT command - Increment the float value of a key
///
/// Syntax: INCRBYFLOAT key increment
///
/// The result is stored without trailing zeros.
pub struct IncrByFloatCommand;

impl Command for IncrByFloatCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let delta = extract_float(&args[1])?;

        let current = match ctx.read::<Bytes>(&key)? {
            Some(value) => parse_stored_float(value)?,
            None => 0.0,
        };
        let next = current + delta;
        if !next.is_finite() {
            return Err(CacheError::NotAFloat);
        }

        *ctx.get_or_create::<Bytes>(&key)? = Bytes::from(format_float(next));
        Ok(Reply::float(next))
    }

    fn name(&self) -> &'static str {
        "INCRBYFLOAT"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}
