//! Key commands (DEL, UNLINK, EXISTS, TYPE, TOUCH, RENAME, RENAMENX, MOVE,
//! DUMP, RESTORE)

use super::{extract_all, extract_bytes, extract_integer, Command, CommandContext};
use crate::error::{CacheError, Result};
use crate::protocol::{Arg, Reply};
use crate::store::{dump, Entry};

/// DEL / UNLINK commands - Delete one or more keys
///
/// Syntax: DEL key [key ...]
pub struct DelCommand {
    name: &'static str,
}

impl DelCommand {
    pub const DEL: DelCommand = DelCommand { name: "DEL" };
    pub const UNLINK: DelCommand = DelCommand { name: "UNLINK" };
}

impl Command for DelCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let keys = extract_all(args)?;
        let now = ctx.now();
        let db = ctx.db();
        let deleted = keys
            .iter()
            .filter(|key| db.remove(key, now).is_some())
            .count();
        Ok(Reply::integer(deleted as i64))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        1
    }
}

/// EXISTS command - Count how many of the given keys exist
///
/// Syntax: EXISTS key [key ...]
///
/// A key given twice is counted twice.
pub struct ExistsCommand;

impl Command for ExistsCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let now = ctx.now();
        let mut count = 0;
        for arg in args {
            let key = extract_bytes(arg)?;
            if ctx.db().contains(&key, now) {
                count += 1;
            }
        }
        Ok(Reply::integer(count))
    }

    fn name(&self) -> &'static str {
        "EXISTS"
    }

    fn min_args(&self) -> usize {
        1
    }
}

/// TYPE command - Kind of value stored at key
///
/// Syntax: TYPE key
pub struct TypeCommand;

impl Command for TypeCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let now = ctx.now();
        let kind = ctx
            .db()
            .entry(&key, now)
            .map(|entry| entry.value.type_name())
            .unwrap_or("none");
        Ok(Reply::status(kind))
    }

    fn name(&self) -> &'static str {
        "TYPE"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// TOUCH command - Refresh the access time of keys
///
/// Syntax: TOUCH key [key ...]
///
/// Returns the number of keys that exist. Expiry is left untouched.
pub struct TouchCommand;

impl Command for TouchCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let now = ctx.now();
        let mut touched = 0;
        for arg in args {
            let key = extract_bytes(arg)?;
            if let Some(entry) = ctx.db().entry_mut(&key, now) {
                entry.touch(now);
                touched += 1;
            }
        }
        Ok(Reply::integer(touched))
    }

    fn name(&self) -> &'static str {
        "TOUCH"
    }

    fn min_args(&self) -> usize {
        1
    }
}

/// RENAME command - Rename a key, overwriting the destination
///
/// Syntax: RENAME key newkey
///
/// The value and its TTL move together.
pub struct RenameCommand;

impl Command for RenameCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let source = extract_bytes(&args[0])?;
        let destination = extract_bytes(&args[1])?;
        let now = ctx.now();
        let db = ctx.db();

        if source == destination {
            return if db.contains(&source, now) {
                Ok(Reply::ok())
            } else {
                Err(CacheError::NoSuchKey)
            };
        }

        let entry = db.remove(&source, now).ok_or(CacheError::NoSuchKey)?;
        db.insert_entry(destination, entry);
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        "RENAME"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// RENAMENX command - Rename a key only if the new name is free
///
/// Syntax: RENAMENX key newkey
pub struct RenameNxCommand;

impl Command for RenameNxCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let source = extract_bytes(&args[0])?;
        let destination = extract_bytes(&args[1])?;
        let now = ctx.now();
        let db = ctx.db();

        if !db.contains(&source, now) {
            return Err(CacheError::NoSuchKey);
        }
        if db.contains(&destination, now) {
            return Ok(Reply::integer(0));
        }

        if let Some(entry) = db.remove(&source, now) {
            db.insert_entry(destination, entry);
        }
        Ok(Reply::integer(1))
    }

    fn name(&self) -> &'static str {
        "RENAMENX"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// MOVE command - Move a key to another database
///
/// Syntax: MOVE key db
///
/// Returns 0 when the key is absent or the target database already has it.
pub struct MoveCommand;

impl Command for MoveCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let index = extract_integer(&args[1]).map_err(|_| CacheError::InvalidDbIndex)?;
        let target = ctx.keyspace.validate(index)?;

        let now = ctx.now();
        let moved = ctx.keyspace.move_key(&key, target, now)?;
        Ok(Reply::integer(i64::from(moved)))
    }

    fn name(&self) -> &'static str {
        "MOVE"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// DUMP command - Serialize the value stored at key
///
/// Syntax: DUMP key
pub struct DumpCommand;

impl Command for DumpCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let now = ctx.now();

        match ctx.db().entry(&key, now) {
            Some(entry) => dump::encode(entry, now).map(Reply::bulk),
            None => Ok(Reply::Nil),
        }
    }

    fn name(&self) -> &'static str {
        "DUMP"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// RESTORE command - Create a key from a DUMP payload
///
/// Syntax: RESTORE key ttl payload [replace]
///
/// `ttl` is in milliseconds; 0, nil or false means no expiry.
pub struct RestoreCommand;

impl Command for RestoreCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let ttl = if args[1].is_truthy() {
            match extract_integer(&args[1])? {
                ms if ms < 0 => return Err(CacheError::InvalidExpire("restore".into())),
                0 => None,
                ms => Some(ms as u64),
            }
        } else {
            None
        };
        let payload = extract_bytes(&args[2])?;
        let replace = args.get(3).map(Arg::is_truthy).unwrap_or(false);

        let now = ctx.now();
        if !replace && ctx.db().contains(&key, now) {
            return Err(CacheError::BusyKey);
        }

        let restored = dump::decode(&payload)?;
        let expire_at = ttl.map(|ms| now.saturating_add(ms));
        let entry = Entry::with_expire_at(restored.value, expire_at, now);
        ctx.db().insert_entry(key, entry);
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        "RESTORE"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::clock::ManualClock;
    use crate::commands::hash::{HGetAllCommand, HSetCommand};
    use crate::commands::string::{GetCommand, SetCommand};
    use crate::commands::ttl::TtlCommand;
    use bytes::Bytes;
    use std::sync::Arc;

    #[test]
    fn test_del_exists() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &args!["a", "1"]).unwrap();
        SetCommand.execute(&mut ctx, &args!["b", "2"]).unwrap();

        let result = ExistsCommand.execute(&mut ctx, &args!["a", "a", "zz"]).unwrap();
        assert_eq!(result, Reply::integer(2));

        let result = DelCommand::DEL.execute(&mut ctx, &args!["a", "zz"]).unwrap();
        assert_eq!(result, Reply::integer(1));
        let result = DelCommand::UNLINK.execute(&mut ctx, &args!["b"]).unwrap();
        assert_eq!(result, Reply::integer(1));

        let result = ExistsCommand.execute(&mut ctx, &args!["a", "b"]).unwrap();
        assert_eq!(result, Reply::integer(0));
    }

    #[test]
    fn test_type() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &args!["s", "1"]).unwrap();
        HSetCommand.execute(&mut ctx, &args!["h", "f", "v"]).unwrap();

        assert_eq!(TypeCommand.execute(&mut ctx, &args!["s"]).unwrap(), Reply::status("string"));
        assert_eq!(TypeCommand.execute(&mut ctx, &args!["h"]).unwrap(), Reply::status("hash"));
        assert_eq!(TypeCommand.execute(&mut ctx, &args!["x"]).unwrap(), Reply::status("none"));
    }

    #[test]
    fn test_touch_counts_existing() {
        let clock = ManualClock::new(0);
        let mut ctx = CommandContext::with_clock(Arc::new(clock.clone()));
        SetCommand.execute(&mut ctx, &args!["a", "1", "PX", 500]).unwrap();
        SetCommand.execute(&mut ctx, &args!["b", "2"]).unwrap();

        clock.advance(100);
        let result = TouchCommand.execute(&mut ctx, &args!["a", "b", "c"]).unwrap();
        assert_eq!(result, Reply::integer(2));

        let entry = ctx.db().peek(b"a").unwrap();
        assert_eq!(entry.last_access, 100);
        assert_eq!(entry.expire_at, Some(500));
    }

    #[test]
    fn test_rename() {
        let mut ctx = CommandContext::new();

        let result = RenameCommand.execute(&mut ctx, &args!["nope", "x"]);
        assert_eq!(result, Err(CacheError::NoSuchKey));

        SetCommand.execute(&mut ctx, &args!["a", "1", "EX", 100]).unwrap();
        SetCommand.execute(&mut ctx, &args!["b", "2"]).unwrap();
        assert_eq!(RenameCommand.execute(&mut ctx, &args!["a", "b"]).unwrap(), Reply::ok());

        assert_eq!(GetCommand.execute(&mut ctx, &args!["b"]).unwrap(), Reply::bulk("1"));
        assert!(GetCommand.execute(&mut ctx, &args!["a"]).unwrap().is_nil());
        assert_eq!(TtlCommand::TTL.execute(&mut ctx, &args!["b"]).unwrap(), Reply::integer(100));
    }

    #[test]
    fn test_renamenx() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &args!["a", "1"]).unwrap();
        SetCommand.execute(&mut ctx, &args!["b", "2"]).unwrap();

        assert_eq!(RenameNxCommand.execute(&mut ctx, &args!["a", "b"]).unwrap(), Reply::integer(0));
        assert_eq!(RenameNxCommand.execute(&mut ctx, &args!["a", "c"]).unwrap(), Reply::integer(1));
        assert_eq!(
            RenameNxCommand.execute(&mut ctx, &args!["a", "d"]),
            Err(CacheError::NoSuchKey)
        );
    }

    #[test]
    fn test_move() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &args!["k", "v"]).unwrap();

        assert_eq!(MoveCommand.execute(&mut ctx, &args!["k", 3]).unwrap(), Reply::integer(1));
        assert_eq!(MoveCommand.execute(&mut ctx, &args!["k", 3]).unwrap(), Reply::integer(0));
        assert_eq!(MoveCommand.execute(&mut ctx, &args!["k", 99]), Err(CacheError::InvalidDbIndex));

        let now = ctx.now();
        assert!(ctx.keyspace.db_mut(3).unwrap().contains(b"k", now));
    }

    #[test]
    fn test_dump_restore() {
        let mut ctx = CommandContext::new();
        HSetCommand.execute(&mut ctx, &args!["h", "f", "v", "g", "w"]).unwrap();

        let payload = DumpCommand.execute(&mut ctx, &args!["h"]).unwrap();
        let payload = payload.as_bulk().unwrap().clone();
        assert!(DumpCommand.execute(&mut ctx, &args!["none"]).unwrap().is_nil());

        let result = RestoreCommand.execute(&mut ctx, &args!["h", 0, payload.clone()]);
        assert_eq!(result, Err(CacheError::BusyKey));

        let result = RestoreCommand.execute(&mut ctx, &args!["copy", Arg::Nil, payload.clone()]).unwrap();
        assert_eq!(result, Reply::ok());
        assert_eq!(
            HGetAllCommand.execute(&mut ctx, &args!["copy"]).unwrap(),
            HGetAllCommand.execute(&mut ctx, &args!["h"]).unwrap()
        );
        assert_eq!(TtlCommand::TTL.execute(&mut ctx, &args!["copy"]).unwrap(), Reply::integer(-1));

        let result = RestoreCommand.execute(&mut ctx, &args!["h", 0, payload, true]).unwrap();
        assert_eq!(result, Reply::ok());

        let result = RestoreCommand.execute(&mut ctx, &args!["bad", 0, "garbage"]);
        assert_eq!(result, Err(CacheError::BadPayload));
    }

    #[test]
    fn test_restore_empty_list_creates_nothing() {
        let mut ctx = CommandContext::new();
        let payload = r#"{"version":1,"ttl":null,"value":{"type":"list","data":[]}}"#;

        let result = RestoreCommand.execute(&mut ctx, &args!["k", 0, payload]);
        assert_eq!(result, Err(CacheError::BadPayload));
        assert_eq!(ExistsCommand.execute(&mut ctx, &args!["k"]).unwrap(), Reply::integer(0));
        assert_eq!(TypeCommand.execute(&mut ctx, &args!["k"]).unwrap(), Reply::status("none"));
    }

    #[test]
    fn test_restore_with_ttl() {
        let clock = ManualClock::new(50_000);
        let mut ctx = CommandContext::with_clock(Arc::new(clock.clone()));
        SetCommand.execute(&mut ctx, &args!["a", "x"]).unwrap();
        let payload: Bytes = DumpCommand.execute(&mut ctx, &args!["a"]).unwrap().as_bulk().unwrap().clone();

        RestoreCommand.execute(&mut ctx, &args!["b", 16_000, payload]).unwrap();
        clock.advance(2_000);
        assert_eq!(TtlCommand::TTL.execute(&mut ctx, &args!["b"]).unwrap(), Reply::integer(14));
        assert_eq!(GetCommand.execute(&mut ctx, &args!["b"]).unwrap(), Reply::bulk("x"));
    }
}
