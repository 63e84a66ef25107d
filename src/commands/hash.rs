//! Hash commands (HSET, HSETNX, HGET, HMGET, HMSET, HDEL, HEXISTS, HINCRBY,
//! HINCRBYFLOAT, HKEYS, HVALS, HGETALL, HLEN, HSTRLEN)

use super::{extract_all, extract_bytes, extract_float, extract_integer, parse_stored_float, parse_stored_integer};
use super::{Command, CommandContext};
use crate::error::{CacheError, Result};
use crate::protocol::{format_float, Arg, Reply};
use crate::store::Hash;
use bytes::Bytes;

/// Collect field/value pairs from either flat arguments or mapping arguments
fn collect_field_values(args: &[Arg], command: &str) -> Result<Vec<(Bytes, Bytes)>> {
    let mut pairs = Vec::new();
    let mut i = 0;
    while i < args.len() {
        match &args[i] {
            Arg::Map(map) => {
                pairs.extend(map.iter().cloned());
                i += 1;
            }
            field => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| CacheError::WrongArity(command.into()))?;
                pairs.push((extract_bytes(field)?, extract_bytes(value)?));
                i += 2;
            }
        }
    }

    if pairs.is_empty() {
        return Err(CacheError::WrongArity(command.into()));
    }
    Ok(pairs)
}

/// Hash entries ordered by field
fn sorted_entries(hash: &Hash) -> Vec<(Bytes, Bytes)> {
    let mut entries: Vec<(Bytes, Bytes)> =
        hash.iter().map(|(f, v)| (f.clone(), v.clone())).collect();
    entries.sort();
    entries
}

/// HSET command - Set fields in the hash stored at key
///
/// Syntax: HSET key field value [field value ...]
///
/// Returns the number of fields that were newly created.
pub struct HSetCommand;

impl Command for HSetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let pairs = collect_field_values(&args[1..], "hset")?;

        let hash = ctx.get_or_create::<Hash>(&key)?;
        let added = pairs
            .into_iter()
            .filter(|(field, value)| hash.insert(field.clone(), value.clone()).is_none())
            .count();

        Ok(Reply::integer(added as i64))
    }

    fn name(&self) -> &'static str {
        "HSET"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// HMSET command - Set multiple fields, from pairs or a single mapping
///
/// Syntax: HMSET key field value [field value ...]
pub struct HMSetCommand;

impl Command for HMSetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let pairs = collect_field_values(&args[1..], "hmset")?;

        let hash = ctx.get_or_create::<Hash>(&key)?;
        hash.extend(pairs);
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        "HMSET"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// HSETNX command - Set a field only if it does not exist
///
/// Syntax: HSETNX key field value
pub struct HSetNxCommand;

impl Command for HSetNxCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let field = extract_bytes(&args[1])?;
        let value = extract_bytes(&args[2])?;

        let hash = ctx.get_or_create::<Hash>(&key)?;
        if hash.contains_key(&field) {
            return Ok(Reply::integer(0));
        }
        hash.insert(field, value);
        Ok(Reply::integer(1))
    }

    fn name(&self) -> &'static str {
        "HSETNX"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// HGET command - Get the value of a hash field
///
/// Syntax: HGET key field
pub struct HGetCommand;

impl Command for HGetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let field = extract_bytes(&args[1])?;

        let value = ctx
            .read::<Hash>(&key)?
            .and_then(|hash| hash.get(&field).cloned());
        Ok(Reply::optional(value))
    }

    fn name(&self) -> &'static str {
        "HGET"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// HMGET command - Get the values of several fields
///
/// Syntax: HMGET key field [field ...]
pub struct HMGetCommand;

impl Command for HMGetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let fields = args[1..]
            .iter()
            .map(extract_bytes)
            .collect::<Result<Vec<_>>>()?;

        let hash = ctx.read::<Hash>(&key)?;
        let values = fields
            .iter()
            .map(|field| Reply::optional(hash.and_then(|h| h.get(field).cloned())))
            .collect();
        Ok(Reply::array(values))
    }

    fn name(&self) -> &'static str {
        "HMGET"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// HDEL command - Delete one or more hash fields
///
/// Syntax: HDEL key field [field ...]
pub struct HDelCommand;

impl Command for HDelCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let fields = extract_all(&args[1..])?;

        let deleted = match ctx.write::<Hash>(&key)? {
            Some(hash) => fields
                .iter()
                .filter(|field| hash.remove(*field).is_some())
                .count(),
            None => return Ok(Reply::integer(0)),
        };

        ctx.cleanup(&key);
        Ok(Reply::integer(deleted as i64))
    }

    fn name(&self) -> &'static str {
        "HDEL"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// HEXISTS command - Check if a field exists
///
/// Syntax: HEXISTS key field
pub struct HExistsCommand;

impl Command for HExistsCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let field = extract_bytes(&args[1])?;

        let exists = ctx
            .read::<Hash>(&key)?
            .map(|hash| hash.contains_key(&field))
            .unwrap_or(false);
        Ok(Reply::integer(i64::from(exists)))
    }

    fn name(&self) -> &'static str {
        "HEXISTS"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// HINCRBY command - Increment the integer value of a hash field
///
/// Syntax: HINCRBY key field increment
pub struct HIncrByCommand;

impl Command for HIncrByCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let field = extract_bytes(&args[1])?;
        let increment = extract_integer(&args[2])?;

        let current = match ctx.read::<Hash>(&key)?.and_then(|hash| hash.get(&field)) {
            Some(value) => parse_stored_integer(value)?,
            None => 0,
        };
        let next = current.checked_add(increment).ok_or(CacheError::Overflow)?;

        let hash = ctx.get_or_create::<Hash>(&key)?;
        hash.insert(field, Bytes::from(next.to_string()));
        Ok(Reply::integer(next))
    }

    fn name(&self) -> &'static str {
        "HINCRBY"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// HINCRBYFLOAT command - Increment the float value of a hash field
///
/// Syntax: HINCRBYFLOAT key field increment
pub struct HIncrByFloatCommand;

impl Command for HIncrByFloatCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let field = extract_bytes(&args[1])?;
        let increment = extract_float(&args[2])?;

        let current = match ctx.read::<Hash>(&key)?.and_then(|hash| hash.get(&field)) {
            Some(value) => parse_stored_float(value)?,
            None => 0.0,
        };
        let next = current + increment;
        if !next.is_finite() {
            return Err(CacheError::NotAFloat);
        }

        let hash = ctx.get_or_create::<Hash>(&key)?;
        hash.insert(field, Bytes::from(format_float(next)));
        Ok(Reply::float(next))
    }

    fn name(&self) -> &'static str {
        "HINCRBYFLOAT"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// HKEYS command - Get all field names in a hash
///
/// Syntax: HKEYS key
pub struct HKeysCommand;

impl Command for HKeysCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let entries = ctx.read::<Hash>(&key)?.map(sorted_entries).unwrap_or_default();
        Ok(Reply::bulk_array(entries.into_iter().map(|(field, _)| field)))
    }

    fn name(&self) -> &'static str {
        "HKEYS"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// HVALS command - Get all values in a hash
///
/// Syntax: HVALS key
pub struct HValsCommand;

impl Command for HValsCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let entries = ctx.read::<Hash>(&key)?.map(sorted_entries).unwrap_or_default();
        Ok(Reply::bulk_array(entries.into_iter().map(|(_, value)| value)))
    }

    fn name(&self) -> &'static str {
        "HVALS"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// HGETALL command - Get all fields and values in a hash
///
/// Syntax: HGETALL key
pub struct HGetAllCommand;

impl Command for HGetAllCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let entries = ctx.read::<Hash>(&key)?.map(sorted_entries).unwrap_or_default();
        Ok(Reply::Map(entries))
    }

    fn name(&self) -> &'static str {
        "HGETALL"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// HLEN command - Number of fields in a hash
///
/// Syntax: HLEN key
pub struct HLenCommand;

impl Command for HLenCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let len = ctx.read::<Hash>(&key)?.map(|hash| hash.len()).unwrap_or(0);
        Ok(Reply::integer(len as i64))
    }

    fn name(&self) -> &'static str {
        "HLEN"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// HSTRLEN command - Character length of a field's value
///
/// Syntax: HSTRLEN key field
pub struct HStrLenCommand;

impl Command for HStrLenCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let field = extract_bytes(&args[1])?;

        let len = ctx
            .read::<Hash>(&key)?
            .and_then(|hash| hash.get(&field))
            .map(|value| String::from_utf8_lossy(value).chars().count())
            .unwrap_or(0);
        Ok(Reply::integer(len as i64))
    }

    fn name(&self) -> &'static str {
        "HSTRLEN"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::commands::string::SetCommand;

    #[test]
    fn test_hset_hget() {
        let mut ctx = CommandContext::new();

        let result = HSetCommand.execute(&mut ctx, &args!["myhash", "field1", "value1"]).unwrap();
        assert_eq!(result, Reply::integer(1));

        let result = HGetCommand.execute(&mut ctx, &args!["myhash", "field1"]).unwrap();
        assert_eq!(result, Reply::bulk("value1"));

        let result = HGetCommand.execute(&mut ctx, &args!["myhash", "nonexistent"]).unwrap();
        assert!(result.is_nil());
    }

    #[test]
    fn test_hset_counts_new_fields_only() {
        let mut ctx = CommandContext::new();
        HSetCommand.execute(&mut ctx, &args!["h", "a", "1"]).unwrap();

        let result = HSetCommand.execute(&mut ctx, &args!["h", "a", "2", "b", "3"]).unwrap();
        assert_eq!(result, Reply::integer(1));

        let result = HSetCommand.execute(&mut ctx, &args!["h", "a"]);
        assert_eq!(result, Err(CacheError::WrongArity("hset".into())));
    }

    #[test]
    fn test_hsetnx_keeps_existing() {
        let mut ctx = CommandContext::new();

        let result = HSetNxCommand.execute(&mut ctx, &args!["h", "f", "first"]).unwrap();
        assert_eq!(result, Reply::integer(1));
        let result = HSetNxCommand.execute(&mut ctx, &args!["h", "f", "second"]).unwrap();
        assert_eq!(result, Reply::integer(0));

        let result = HGetCommand.execute(&mut ctx, &args!["h", "f"]).unwrap();
        assert_eq!(result, Reply::bulk("first"));
    }

    #[test]
    fn test_hmset_mapping_and_hmget() {
        let mut ctx = CommandContext::new();
        let args = vec![Arg::from("h"), Arg::map([("a", "1"), ("b", "2")])];
        assert_eq!(HMSetCommand.execute(&mut ctx, &args).unwrap(), Reply::ok());

        let result = HMGetCommand.execute(&mut ctx, &args!["h", "a", "x", "b"]).unwrap();
        assert_eq!(
            result,
            Reply::array(vec![Reply::bulk("1"), Reply::Nil, Reply::bulk("2")])
        );

        let result = HMGetCommand.execute(&mut ctx, &args!["missing", "a"]).unwrap();
        assert_eq!(result, Reply::array(vec![Reply::Nil]));
    }

    #[test]
    fn test_hgetall_keys_vals() {
        let mut ctx = CommandContext::new();
        HMSetCommand.execute(&mut ctx, &args!["h", "b", "2", "a", "1"]).unwrap();

        let result = HGetAllCommand.execute(&mut ctx, &args!["h"]).unwrap();
        assert_eq!(
            result,
            Reply::Map(vec![
                (Bytes::from("a"), Bytes::from("1")),
                (Bytes::from("b"), Bytes::from("2")),
            ])
        );

        let result = HKeysCommand.execute(&mut ctx, &args!["h"]).unwrap();
        assert_eq!(result, Reply::array(vec![Reply::bulk("a"), Reply::bulk("b")]));

        let result = HValsCommand.execute(&mut ctx, &args!["h"]).unwrap();
        assert_eq!(result, Reply::array(vec![Reply::bulk("1"), Reply::bulk("2")]));

        let result = HGetAllCommand.execute(&mut ctx, &args!["none"]).unwrap();
        assert_eq!(result, Reply::Map(vec![]));
    }

    #[test]
    fn test_hdel_removes_empty_hash() {
        let mut ctx = CommandContext::new();
        HSetCommand.execute(&mut ctx, &args!["h", "a", "1", "b", "2"]).unwrap();

        let result = HDelCommand.execute(&mut ctx, &args!["h", "a", "zz"]).unwrap();
        assert_eq!(result, Reply::integer(1));
        assert_eq!(HLenCommand.execute(&mut ctx, &args!["h"]).unwrap(), Reply::integer(1));

        HDelCommand.execute(&mut ctx, &args!["h", "b"]).unwrap();
        assert_eq!(ctx.read::<Hash>(b"h"), Ok(None));
    }

    #[test]
    fn test_hdel_bad_field_deletes_nothing() {
        let mut ctx = CommandContext::new();
        HSetCommand.execute(&mut ctx, &args!["h", "f", "v"]).unwrap();

        let result = HDelCommand.execute(&mut ctx, &[Arg::from("h"), Arg::from("f"), Arg::Nil]);
        assert!(matches!(result, Err(CacheError::Syntax(_))));
        assert_eq!(HLenCommand.execute(&mut ctx, &args!["h"]).unwrap(), Reply::integer(1));
        assert_eq!(HGetCommand.execute(&mut ctx, &args!["h", "f"]).unwrap(), Reply::bulk("v"));
    }

    #[test]
    fn test_hincrby() {
        let mut ctx = CommandContext::new();

        let result = HIncrByCommand.execute(&mut ctx, &args!["h", "n", 5]).unwrap();
        assert_eq!(result, Reply::integer(5));
        let result = HIncrByCommand.execute(&mut ctx, &args!["h", "n", -8]).unwrap();
        assert_eq!(result, Reply::integer(-3));

        HSetCommand.execute(&mut ctx, &args!["h", "s", "abc"]).unwrap();
        let result = HIncrByCommand.execute(&mut ctx, &args!["h", "s", 1]);
        assert_eq!(result, Err(CacheError::NotAnInteger));
    }

    #[test]
    fn test_hincrbyfloat() {
        let mut ctx = CommandContext::new();
        HSetCommand.execute(&mut ctx, &args!["h", "f", "10.5"]).unwrap();

        let result = HIncrByFloatCommand.execute(&mut ctx, &args!["h", "f", 16]).unwrap();
        assert_eq!(result, Reply::float(26.5));

        let result = HIncrByFloatCommand.execute(&mut ctx, &args!["h", "new", "3.14"]).unwrap();
        assert_eq!(result, Reply::float(3.14));

        let result = HGetCommand.execute(&mut ctx, &args!["h", "f"]).unwrap();
        assert_eq!(result, Reply::bulk("26.5"));

        HSetCommand.execute(&mut ctx, &args!["h", "s", "abc"]).unwrap();
        let result = HIncrByFloatCommand.execute(&mut ctx, &args!["h", "s", 1]);
        assert_eq!(result, Err(CacheError::NotAFloat));
    }

    #[test]
    fn test_hstrlen_counts_characters() {
        let mut ctx = CommandContext::new();
        HSetCommand.execute(&mut ctx, &args!["h", "f", "héllo"]).unwrap();

        let result = HStrLenCommand.execute(&mut ctx, &args!["h", "f"]).unwrap();
        assert_eq!(result, Reply::integer(5));
        let result = HStrLenCommand.execute(&mut ctx, &args!["h", "none"]).unwrap();
        assert_eq!(result, Reply::integer(0));
    }

    #[test]
    fn test_wrong_type() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &args!["s", "v"]).unwrap();

        let result = HSetCommand.execute(&mut ctx, &args!["s", "f", "v"]);
        assert_eq!(result, Err(CacheError::WrongType));
        let result = HGetCommand.execute(&mut ctx, &args!["s", "f"]);
        assert_eq!(result, Err(CacheError::WrongType));
    }
}
