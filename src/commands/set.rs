//! Set commands (SADD, SREM, SCARD, SISMEMBER, SMEMBERS, SDIFF, SINTER,
//! SUNION, SDIFFSTORE, SINTERSTORE, SUNIONSTORE, SMOVE, SPOP, SRANDMEMBER)

use super::{extract_all, extract_bytes, extract_integer, Command, CommandContext};
use crate::error::{CacheError, Result};
use crate::protocol::{Arg, Reply};
use crate::store::{Set, Value};
use bytes::Bytes;
use rand::seq::SliceRandom;

/// Largest repeat count SRANDMEMBER accepts with a negative count
const MAX_REPEATED_SAMPLE: u64 = 1 << 20;

/// Members in byte order, so seeded sampling is reproducible
fn sorted_members(set: &Set) -> Vec<Bytes> {
    let mut members: Vec<Bytes> = set.iter().cloned().collect();
    members.sort();
    members
}

/// SADD command - Add one or more members to a set
///
/// Syntax: SADD key member [member ...]
pub struct SAddCommand;

impl Command for SAddCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let members = extract_all(&args[1..])?;

        let set = ctx.get_or_create::<Set>(&key)?;
        let added = members.into_iter().filter(|m| set.insert(m.clone())).count();
        Ok(Reply::integer(added as i64))
    }

    fn name(&self) -> &'static str {
        "SADD"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// SREM command - Remove members from a set
///
/// Syntax: SREM key member [member ...]
pub struct SRemCommand;

impl Command for SRemCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let members = extract_all(&args[1..])?;

        let removed = match ctx.write::<Set>(&key)? {
            Some(set) => members.iter().filter(|m| set.remove(*m)).count(),
            None => 0,
        };
        ctx.cleanup(&key);
        Ok(Reply::integer(removed as i64))
    }

    fn name(&self) -> &'static str {
        "SREM"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// SCARD command - Get the number of members in a set
///
/// Syntax: SCARD key
pub struct SCardCommand;

impl Command for SCardCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let len = ctx.read::<Set>(&key)?.map(|set| set.len()).unwrap_or(0);
        Ok(Reply::integer(len as i64))
    }

    fn name(&self) -> &'static str {
        "SCARD"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// SISMEMBER command - Check set membership
///
/// Syntax: SISMEMBER key member
pub struct SIsMemberCommand;

impl Command for SIsMemberCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let member = extract_bytes(&args[1])?;

        let found = ctx
            .read::<Set>(&key)?
            .map(|set| set.contains(&member))
            .unwrap_or(false);
        Ok(Reply::integer(i64::from(found)))
    }

    fn name(&self) -> &'static str {
        "SISMEMBER"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// SMEMBERS command - Get all members in a set
///
/// Syntax: SMEMBERS key
pub struct SMembersCommand;

impl Command for SMembersCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let members = ctx.read::<Set>(&key)?.map(sorted_members).unwrap_or_default();
        Ok(Reply::bulk_array(members))
    }

    fn name(&self) -> &'static str {
        "SMEMBERS"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// Set algebra operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOp {
    Diff,
    Inter,
    Union,
}

impl SetOp {
    /// Apply the operation over the sets at `keys`; absent keys are empty sets
    fn apply(self, ctx: &mut CommandContext, keys: &[Bytes]) -> Result<Set> {
        let mut sets = Vec::with_capacity(keys.len());
        for key in keys {
            sets.push(ctx.read::<Set>(key)?.cloned().unwrap_or_default());
        }

        let mut rest = sets.into_iter();
        let first = rest.next().unwrap_or_default();
        let result = match self {
            SetOp::Diff => rest.fold(first, |acc, other| &acc - &other),
            SetOp::Inter => rest.fold(first, |acc, other| &acc & &other),
            SetOp::Union => rest.fold(first, |acc, other| &acc | &other),
        };
        Ok(result)
    }
}

/// SDIFF / SINTER / SUNION commands - Set algebra over keys
///
/// Syntax: SDIFF key [key ...]
///
/// SDIFF is the first set minus the union of all the others.
pub struct SetAlgebraCommand {
    name: &'static str,
    op: SetOp,
}

impl SetAlgebraCommand {
    pub const SDIFF: SetAlgebraCommand = SetAlgebraCommand {
        name: "SDIFF",
        op: SetOp::Diff,
    };

    pub const SINTER: SetAlgebraCommand = SetAlgebraCommand {
        name: "SINTER",
        op: SetOp::Inter,
    };

    pub const SUNION: SetAlgebraCommand = SetAlgebraCommand {
        name: "SUNION",
        op: SetOp::Union,
    };
}

impl Command for SetAlgebraCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let keys = extract_all(args)?;
        let result = self.op.apply(ctx, &keys)?;
        Ok(Reply::bulk_array(sorted_members(&result)))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        1
    }
}

/// SDIFFSTORE / SINTERSTORE / SUNIONSTORE commands - Store a set algebra result
///
/// Syntax: SDIFFSTORE destination key [key ...]
///
/// The destination is overwritten; an empty result deletes it.
pub struct SetAlgebraStoreCommand {
    name: &'static str,
    op: SetOp,
}

impl SetAlgebraStoreCommand {
    pub const SDIFFSTORE: SetAlgebraStoreCommand = SetAlgebraStoreCommand {
        name: "SDIFFSTORE",
        op: SetOp::Diff,
    };

    pub const SINTERSTORE: SetAlgebraStoreCommand = SetAlgebraStoreCommand {
        name: "SINTERSTORE",
        op: SetOp::Inter,
    };

    pub const SUNIONSTORE: SetAlgebraStoreCommand = SetAlgebraStoreCommand {
        name: "SUNIONSTORE",
        op: SetOp::Union,
    };
}

impl Command for SetAlgebraStoreCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let destination = extract_bytes(&args[0])?;
        let keys = extract_all(&args[1..])?;
        let result = self.op.apply(ctx, &keys)?;
        let len = result.len();

        let now = ctx.now();
        if result.is_empty() {
            ctx.db().remove(&destination, now);
        } else {
            ctx.db().set(destination, Value::Set(result), now);
        }
        Ok(Reply::integer(len as i64))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// SMOVE command - Move a member between sets
///
/// Syntax: SMOVE source destination member
pub struct SMoveCommand;

impl Command for SMoveCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let source = extract_bytes(&args[0])?;
        let destination = extract_bytes(&args[1])?;
        let member = extract_bytes(&args[2])?;

        ctx.read::<Set>(&destination)?;
        let present = ctx
            .read::<Set>(&source)?
            .map(|set| set.contains(&member))
            .unwrap_or(false);
        if !present || source == destination {
            return Ok(Reply::integer(i64::from(present)));
        }

        if let Some(set) = ctx.write::<Set>(&source)? {
            set.remove(&member);
        }
        ctx.cleanup(&source);
        ctx.get_or_create::<Set>(&destination)?.insert(member);
        Ok(Reply::integer(1))
    }

    fn name(&self) -> &'static str {
        "SMOVE"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// Parse an optional non-negative count argument
fn parse_count(args: &[Arg]) -> Result<Option<i64>> {
    args.get(1).map(extract_integer).transpose()
}

/// SPOP command - Remove and return random members
///
/// Syntax: SPOP key [count]
///
/// Without count the reply is a single member or nil; with count it is an
/// array of up to count distinct members.
pub struct SPopCommand;

impl Command for SPopCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let count = parse_count(args)?;
        if matches!(count, Some(n) if n < 0) {
            return Err(CacheError::OutOfRange);
        }

        let members = ctx.read::<Set>(&key)?.map(sorted_members).unwrap_or_default();
        let picked: Vec<Bytes> = match count {
            Some(n) => members
                .choose_multiple(&mut ctx.rng, n as usize)
                .cloned()
                .collect(),
            None => members.choose(&mut ctx.rng).cloned().into_iter().collect(),
        };

        if let Some(set) = ctx.write::<Set>(&key)? {
            for member in &picked {
                set.remove(member);
            }
        }
        ctx.cleanup(&key);

        Ok(match count {
            Some(_) => Reply::bulk_array(picked),
            None => Reply::optional(picked.into_iter().next()),
        })
    }

    fn name(&self) -> &'static str {
        "SPOP"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// SRANDMEMBER command - Return random members without removing them
///
/// Syntax: SRANDMEMBER key [count]
///
/// A positive count returns up to count distinct members; a negative count
/// returns exactly |count| members, possibly repeated, up to 2^20 of them.
pub struct SRandMemberCommand;

impl Command for SRandMemberCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let count = parse_count(args)?;

        let members = ctx.read::<Set>(&key)?.map(sorted_members).unwrap_or_default();
        let rng = &mut ctx.rng;

        Ok(match count {
            None => Reply::optional(members.choose(rng).cloned()),
            Some(n) if n >= 0 => {
                Reply::bulk_array(members.choose_multiple(rng, n as usize).cloned())
            }
            Some(n) => {
                if n.unsigned_abs() > MAX_REPEATED_SAMPLE {
                    return Err(CacheError::OutOfRange);
                }
                if members.is_empty() {
                    return Ok(Reply::array(vec![]));
                }
                Reply::bulk_array(
                    (0..n.unsigned_abs())
                        .filter_map(|_| members.choose(rng).cloned())
                        .collect::<Vec<_>>(),
                )
            }
        })
    }

    fn name(&self) -> &'static str {
        "SRANDMEMBER"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}
