//! String commands (SET, GET, GETSET, SETNX, SETEX, PSETEX, APPEND, STRLEN,
//! MGET, MSET, MSETNX, GETRANGE, SETRANGE)

use super::{extract_bytes, extract_integer, is_keyword, normalize_range, Command, CommandContext};
use crate::error::{CacheError, Result};
use crate::protocol::{Arg, Reply};
use crate::store::{Entry, Value};
use bytes::{Bytes, BytesMut};

/// Largest string SETRANGE may produce
const MAX_STRING_LEN: usize = 512 * 1024 * 1024;

/// Store a string with a relative TTL, replacing whatever the key held
fn store_with_ttl(ctx: &mut CommandContext, key: Bytes, value: Bytes, ttl_ms: Option<u64>) {
    let now = ctx.now();
    let expire_at = ttl_ms.map(|ms| now.saturating_add(ms));
    let entry = Entry::with_expire_at(Value::String(value), expire_at, now);
    ctx.db().insert_entry(key, entry);
}

/// SET command - Set key to hold the string value
///
/// Syntax: SET key value [EX seconds|PX milliseconds] [NX|XX]
pub struct SetCommand;

impl Command for SetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let value = extract_bytes(&args[1])?;

        let mut ttl_ms: Option<u64> = None;
        let mut nx = false;
        let mut xx = false;

        let mut i = 2;
        while i < args.len() {
            let opt = &args[i];
            if is_keyword(opt, "NX") {
                nx = true;
            } else if is_keyword(opt, "XX") {
                xx = true;
            } else if is_keyword(opt, "EX") || is_keyword(opt, "PX") {
                if ttl_ms.is_some() {
                    return Err(CacheError::syntax("EX and PX are mutually exclusive"));
                }
                let amount = args
                    .get(i + 1)
                    .ok_or_else(|| CacheError::syntax("EX/PX require a value"))
                    .and_then(extract_integer)?;
                if amount <= 0 {
                    return Err(CacheError::InvalidExpire("set".into()));
                }
                let ms = if is_keyword(opt, "EX") {
                    amount
                        .checked_mul(1000)
                        .ok_or_else(|| CacheError::InvalidExpire("set".into()))?
                } else {
                    amount
                };
                ttl_ms = Some(ms as u64);
                i += 1;
            } else {
                return Err(CacheError::syntax("unknown SET option"));
            }
            i += 1;
        }

        if nx && xx {
            return Err(CacheError::syntax("NX and XX are mutually exclusive"));
        }

        if nx || xx {
            let now = ctx.now();
            let exists = ctx.db().contains(&key, now);
            if (nx && exists) || (xx && !exists) {
                return Ok(Reply::Nil);
            }
        }

        store_with_ttl(ctx, key, value, ttl_ms);
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        "SET"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// GET command - Get the value of key
///
/// Syntax: GET key
pub struct GetCommand;

impl Command for GetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        Ok(Reply::optional(ctx.read::<Bytes>(&key)?.cloned()))
    }

    fn name(&self) -> &'static str {
        "GET"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// GETSET command - Set a new value and return the old one
///
/// Syntax: GETSET key value
pub struct GetSetCommand;

impl Command for GetSetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let value = extract_bytes(&args[1])?;

        let old = ctx.read::<Bytes>(&key)?.cloned();
        store_with_ttl(ctx, key, value, None);
        Ok(Reply::optional(old))
    }

    fn name(&self) -> &'static str {
        "GETSET"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// SETNX command - Set key only if it does not exist
///
/// Syntax: SETNX key value
pub struct SetNxCommand;

impl Command for SetNxCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let value = extract_bytes(&args[1])?;

        let now = ctx.now();
        if ctx.db().contains(&key, now) {
            return Ok(Reply::integer(0));
        }
        store_with_ttl(ctx, key, value, None);
        Ok(Reply::integer(1))
    }

    fn name(&self) -> &'static str {
        "SETNX"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// SETEX / PSETEX commands - Set a value together with its TTL
///
/// Syntax: SETEX key seconds value
/// Syntax: PSETEX key milliseconds value
pub struct SetExCommand {
    name: &'static str,
    unit_ms: i64,
}

impl SetExCommand {
    pub const SECONDS: SetExCommand = SetExCommand {
        name: "SETEX",
        unit_ms: 1000,
    };

    pub const MILLISECONDS: SetExCommand = SetExCommand {
        name: "PSETEX",
        unit_ms: 1,
    };
}

impl Command for SetExCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let amount = extract_integer(&args[1])?;
        let value = extract_bytes(&args[2])?;

        let invalid = || CacheError::InvalidExpire(self.name.to_lowercase());
        if amount <= 0 {
            return Err(invalid());
        }
        let ms = amount.checked_mul(self.unit_ms).ok_or_else(invalid)?;

        store_with_ttl(ctx, key, value, Some(ms as u64));
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// APPEND command - Append a value to a string
///
/// Syntax: APPEND key value
pub struct AppendCommand;

impl Command for AppendCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let suffix = extract_bytes(&args[1])?;

        let slot = ctx.get_or_create::<Bytes>(&key)?;
        let mut buf = BytesMut::with_capacity(slot.len() + suffix.len());
        buf.extend_from_slice(slot);
        buf.extend_from_slice(&suffix);
        *slot = buf.freeze();

        Ok(Reply::integer(slot.len() as i64))
    }

    fn name(&self) -> &'static str {
        "APPEND"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// STRLEN command - Length of the string stored at key
///
/// Syntax: STRLEN key
pub struct StrLenCommand;

impl Command for StrLenCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let len = ctx.read::<Bytes>(&key)?.map(|s| s.len()).unwrap_or(0);
        Ok(Reply::integer(len as i64))
    }

    fn name(&self) -> &'static str {
        "STRLEN"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// MGET command - Get the values of all given keys
///
/// Syntax: MGET key [key ...]
///
/// Keys that are absent or hold a non-string value yield nil.
pub struct MGetCommand;

impl Command for MGetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let now = ctx.now();
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let key = extract_bytes(arg)?;
            let reply = match ctx.db().get(&key, now) {
                Some(Value::String(s)) => Reply::Bulk(s.clone()),
                _ => Reply::Nil,
            };
            values.push(reply);
        }
        Ok(Reply::array(values))
    }

    fn name(&self) -> &'static str {
        "MGET"
    }

    fn min_args(&self) -> usize {
        1
    }
}

/// Parse `key value [key value ...]`
fn collect_pairs(args: &[Arg], command: &str) -> Result<Vec<(Bytes, Bytes)>> {
    if args.len() % 2 != 0 {
        return Err(CacheError::WrongArity(command.into()));
    }
    args.chunks(2)
        .map(|pair| Ok((extract_bytes(&pair[0])?, extract_bytes(&pair[1])?)))
        .collect()
}

/// MSET command - Set multiple keys at once
///
/// Syntax: MSET key value [key value ...]
pub struct MSetCommand;

impl Command for MSetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        for (key, value) in collect_pairs(args, "mset")? {
            store_with_ttl(ctx, key, value, None);
        }
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        "MSET"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// MSETNX command - Set multiple keys only if none of them exists
///
/// Syntax: MSETNX key value [key value ...]
pub struct MSetNxCommand;

impl Command for MSetNxCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let pairs = collect_pairs(args, "msetnx")?;
        let now = ctx.now();

        if pairs.iter().any(|(key, _)| ctx.db().contains(key, now)) {
            return Ok(Reply::integer(0));
        }
        for (key, value) in pairs {
            store_with_ttl(ctx, key, value, None);
        }
        Ok(Reply::integer(1))
    }

    fn name(&self) -> &'static str {
        "MSETNX"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// GETRANGE command - Substring between two inclusive offsets
///
/// Syntax: GETRANGE key start end
pub struct GetRangeCommand;

impl Command for GetRangeCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let start = extract_integer(&args[1])?;
        let end = extract_integer(&args[2])?;

        let value = ctx.read::<Bytes>(&key)?.cloned().unwrap_or_default();
        let slice = match normalize_range(start, end, value.len()) {
            Some((from, to)) => value.slice(from..=to),
            None => Bytes::new(),
        };
        Ok(Reply::Bulk(slice))
    }

    fn name(&self) -> &'static str {
        "GETRANGE"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// SETRANGE command - Overwrite part of a string, zero-padding as needed
///
/// Syntax: SETRANGE key offset value
pub struct SetRangeCommand;

impl Command for SetRangeCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let offset = extract_integer(&args[1])?;
        let patch = extract_bytes(&args[2])?;

        let offset = usize::try_from(offset).map_err(|_| CacheError::OutOfRange)?;

        if patch.is_empty() {
            let len = ctx.read::<Bytes>(&key)?.map(|s| s.len()).unwrap_or(0);
            return Ok(Reply::integer(len as i64));
        }

        let end = offset
            .checked_add(patch.len())
            .filter(|end| *end <= MAX_STRING_LEN)
            .ok_or(CacheError::OutOfRange)?;

        let slot = ctx.get_or_create::<Bytes>(&key)?;
        let mut buf = BytesMut::from(&slot[..]);
        if buf.len() < end {
            buf.resize(end, 0);
        }
        buf[offset..end].copy_from_slice(&patch);
        *slot = buf.freeze();

        Ok(Reply::integer(slot.len() as i64))
    }

    fn name(&self) -> &'static str {
        "SETRANGE"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::clock::ManualClock;
    use crate::store::List;
    use std::sync::Arc;

    #[test]
    fn test_set_get() {
        let mut ctx = CommandContext::new();

        let result = SetCommand.execute(&mut ctx, &args!["mykey", "myvalue"]).unwrap();
        assert_eq!(result, Reply::ok());

        let result = GetCommand.execute(&mut ctx, &args!["mykey"]).unwrap();
        assert_eq!(result, Reply::bulk("myvalue"));

        let result = GetCommand.execute(&mut ctx, &args!["missing"]).unwrap();
        assert!(result.is_nil());
    }

    #[test]
    fn test_get_wrong_type() {
        let mut ctx = CommandContext::new();
        ctx.get_or_create::<List>(&Bytes::from("list")).unwrap().push_back(Bytes::from("a"));

        let result = GetCommand.execute(&mut ctx, &args!["list"]);
        assert_eq!(result, Err(CacheError::WrongType));
    }

    #[test]
    fn test_set_nx_xx() {
        let mut ctx = CommandContext::new();

        let result = SetCommand.execute(&mut ctx, &args!["k", "v", "XX"]).unwrap();
        assert!(result.is_nil());

        let result = SetCommand.execute(&mut ctx, &args!["k", "v", "nx"]).unwrap();
        assert_eq!(result, Reply::ok());

        let result = SetCommand.execute(&mut ctx, &args!["k", "w", "NX"]).unwrap();
        assert!(result.is_nil());

        let result = SetCommand.execute(&mut ctx, &args!["k", "w", "NX", "XX"]);
        assert!(matches!(result, Err(CacheError::Syntax(_))));
    }

    #[test]
    fn test_set_with_expiry() {
        let clock = ManualClock::new(0);
        let mut ctx = CommandContext::with_clock(Arc::new(clock.clone()));

        SetCommand.execute(&mut ctx, &args!["k", "v", "PX", 100]).unwrap();
        clock.advance(99);
        assert_eq!(GetCommand.execute(&mut ctx, &args!["k"]).unwrap(), Reply::bulk("v"));
        clock.advance(1);
        assert!(GetCommand.execute(&mut ctx, &args!["k"]).unwrap().is_nil());

        let result = SetCommand.execute(&mut ctx, &args!["k", "v", "EX", 0]);
        assert_eq!(result, Err(CacheError::InvalidExpire("set".into())));
    }

    #[test]
    fn test_getset_and_setnx() {
        let mut ctx = CommandContext::new();

        let result = GetSetCommand.execute(&mut ctx, &args!["k", "a"]).unwrap();
        assert!(result.is_nil());
        let result = GetSetCommand.execute(&mut ctx, &args!["k", "b"]).unwrap();
        assert_eq!(result, Reply::bulk("a"));

        assert_eq!(SetNxCommand.execute(&mut ctx, &args!["k", "c"]).unwrap(), Reply::integer(0));
        assert_eq!(SetNxCommand.execute(&mut ctx, &args!["n", "c"]).unwrap(), Reply::integer(1));
        assert_eq!(GetCommand.execute(&mut ctx, &args!["k"]).unwrap(), Reply::bulk("b"));
    }

    #[test]
    fn test_setex_rejects_non_positive_ttl() {
        let mut ctx = CommandContext::new();
        let result = SetExCommand::SECONDS.execute(&mut ctx, &args!["k", 0, "v"]);
        assert_eq!(result, Err(CacheError::InvalidExpire("setex".into())));

        let result = SetExCommand::MILLISECONDS.execute(&mut ctx, &args!["k", -5, "v"]);
        assert_eq!(result, Err(CacheError::InvalidExpire("psetex".into())));

        let result = SetExCommand::SECONDS.execute(&mut ctx, &args!["k", 10, "v"]).unwrap();
        assert_eq!(result, Reply::ok());
    }

    #[test]
    fn test_append_strlen() {
        let mut ctx = CommandContext::new();
        assert_eq!(AppendCommand.execute(&mut ctx, &args!["k", "Hello"]).unwrap(), Reply::integer(5));
        assert_eq!(AppendCommand.execute(&mut ctx, &args!["k", " World"]).unwrap(), Reply::integer(11));
        assert_eq!(StrLenCommand.execute(&mut ctx, &args!["k"]).unwrap(), Reply::integer(11));
        assert_eq!(StrLenCommand.execute(&mut ctx, &args!["nope"]).unwrap(), Reply::integer(0));
    }

    #[test]
    fn test_mset_mget_msetnx() {
        let mut ctx = CommandContext::new();
        MSetCommand.execute(&mut ctx, &args!["a", "1", "b", "2"]).unwrap();
        ctx.get_or_create::<List>(&Bytes::from("l")).unwrap().push_back(Bytes::from("x"));

        let result = MGetCommand.execute(&mut ctx, &args!["a", "missing", "l", "b"]).unwrap();
        assert_eq!(
            result,
            Reply::array(vec![Reply::bulk("1"), Reply::Nil, Reply::Nil, Reply::bulk("2")])
        );

        let result = MSetNxCommand.execute(&mut ctx, &args!["c", "3", "a", "9"]).unwrap();
        assert_eq!(result, Reply::integer(0));
        assert!(GetCommand.execute(&mut ctx, &args!["c"]).unwrap().is_nil());

        let result = MSetNxCommand.execute(&mut ctx, &args!["c", "3", "d", "4"]).unwrap();
        assert_eq!(result, Reply::integer(1));

        let result = MSetCommand.execute(&mut ctx, &args!["a", "1", "b"]);
        assert_eq!(result, Err(CacheError::WrongArity("mset".into())));
    }

    #[test]
    fn test_getrange_setrange() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &args!["k", "This is a string"]).unwrap();

        let get = |ctx: &mut CommandContext, s: i64, e: i64| {
            GetRangeCommand.execute(ctx, &args!["k", s, e]).unwrap()
        };
        assert_eq!(get(&mut ctx, 0, 3), Reply::bulk("This"));
        assert_eq!(get(&mut ctx, -3, -1), Reply::bulk("ing"));
        assert_eq!(get(&mut ctx, 10, 100), Reply::bulk("string"));
        assert_eq!(get(&mut ctx, 5, 1), Reply::bulk(""));

        let result = SetRangeCommand.execute(&mut ctx, &args!["pad", 3, "ab"]).unwrap();
        assert_eq!(result, Reply::integer(5));
        let result = GetCommand.execute(&mut ctx, &args!["pad"]).unwrap();
        assert_eq!(result, Reply::bulk(Bytes::from_static(b"\0\0\0ab")));

        let result = SetRangeCommand.execute(&mut ctx, &args!["k", -1, "x"]);
        assert_eq!(result, Err(CacheError::OutOfRange));
    }
}
