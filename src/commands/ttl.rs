//! TTL commands (EXPIRE, PEXPIRE, EXPIREAT, PEXPIREAT, PERSIST, TTL, PTTL)
//!
//! Deadlines are absolute milliseconds. Expired keys are only removed when
//! something looks at them.

use super::{extract_bytes, extract_integer, Command, CommandContext};
use crate::error::{CacheError, Result};
use crate::protocol::{Arg, Reply};

/// EXPIRE / PEXPIRE / EXPIREAT / PEXPIREAT commands - Set a timeout on a key
///
/// Syntax: EXPIRE key seconds
/// Syntax: PEXPIREAT key unix-time-milliseconds
///
/// Returns 1 if the timeout was set, 0 if the key does not exist. A deadline
/// that is already due deletes the key.
pub struct ExpireCommand {
    name: &'static str,
    unit_ms: i64,
    absolute: bool,
}

impl ExpireCommand {
    pub const EXPIRE: ExpireCommand = ExpireCommand {
        name: "EXPIRE",
        unit_ms: 1000,
        absolute: false,
    };

    pub const PEXPIRE: ExpireCommand = ExpireCommand {
        name: "PEXPIRE",
        unit_ms: 1,
        absolute: false,
    };

    pub const EXPIREAT: ExpireCommand = ExpireCommand {
        name: "EXPIREAT",
        unit_ms: 1000,
        absolute: true,
    };

    pub const PEXPIREAT: ExpireCommand = ExpireCommand {
        name: "PEXPIREAT",
        unit_ms: 1,
        absolute: true,
    };
}

impl Command for ExpireCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let amount = extract_integer(&args[1])?;

        let invalid = || CacheError::InvalidExpire(self.name.to_lowercase());
        let now = ctx.now();
        let scaled = amount.checked_mul(self.unit_ms).ok_or_else(invalid)?;
        let deadline = if self.absolute {
            scaled
        } else {
            (now as i64).checked_add(scaled).ok_or_else(invalid)?
        };

        let db = ctx.db();
        if !db.contains(&key, now) {
            return Ok(Reply::integer(0));
        }

        if deadline <= now as i64 {
            db.remove(&key, now);
        } else if let Some(entry) = db.entry_mut(&key, now) {
            entry.expire_at = Some(deadline as u64);
        }
        Ok(Reply::integer(1))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// PERSIST command - Remove the timeout of a key
///
/// Syntax: PERSIST key
///
/// Returns 1 if a timeout was removed, 0 otherwise.
pub struct PersistCommand;

impl Command for PersistCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let now = ctx.now();

        let removed = ctx
            .db()
            .entry_mut(&key, now)
            .and_then(|entry| entry.expire_at.take())
            .is_some();
        Ok(Reply::integer(i64::from(removed)))
    }

    fn name(&self) -> &'static str {
        "PERSIST"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// TTL / PTTL commands - Get the time to live for a key
///
/// Syntax: TTL key
///
/// Returns:
/// - The TTL in seconds (rounded to nearest) or milliseconds
/// - -1 if the key exists but has no expiration
/// - -2 if the key does not exist
pub struct TtlCommand {
    name: &'static str,
    millis: bool,
}

impl TtlCommand {
    pub const TTL: TtlCommand = TtlCommand {
        name: "TTL",
        millis: false,
    };

    pub const PTTL: TtlCommand = TtlCommand {
        name: "PTTL",
        millis: true,
    };
}

impl Command for TtlCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let now = ctx.now();

        let ttl = match ctx.db().entry(&key, now) {
            None => -2,
            Some(entry) => match entry.remaining_ms(now) {
                None => -1,
                Some(ms) if self.millis => ms as i64,
                Some(ms) => ((ms + 500) / 1000) as i64,
            },
        };
        Ok(Reply::integer(ttl))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}
