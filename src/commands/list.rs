//! List commands (LPUSH, RPUSH, LPUSHX, RPUSHX, LLEN, LINDEX, LINSERT, LPOP,
//! RPOP, LRANGE, LREM, LSET, LTRIM, RPOPLPUSH)

use super::{extract_all, extract_bytes, extract_integer, is_keyword, normalize_range};
use super::{Command, CommandContext};
use crate::error::{CacheError, Result};
use crate::protocol::{Arg, Reply};
use crate::store::List;

/// Which end of a list an operation works on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    Head,
    Tail,
}

impl End {
    fn push(self, list: &mut List, value: bytes::Bytes) {
        match self {
            End::Head => list.push_front(value),
            End::Tail => list.push_back(value),
        }
    }

    fn pop(self, list: &mut List) -> Option<bytes::Bytes> {
        match self {
            End::Head => list.pop_front(),
            End::Tail => list.pop_back(),
        }
    }
}

/// Resolve a possibly negative index against a list length
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let len = len as i64;
    let index = if index < 0 { len + index } else { index };
    if (0..len).contains(&index) {
        Some(index as usize)
    } else {
        None
    }
}

/// LPUSH / RPUSH / LPUSHX / RPUSHX commands - Insert values at one end
///
/// Syntax: LPUSH key value [value ...]
///
/// Values are pushed one at a time, so `LPUSH k a b c` leaves `c b a`.
/// The X variants only push onto an existing list.
pub struct PushCommand {
    name: &'static str,
    end: End,
    only_existing: bool,
}

impl PushCommand {
    pub const LPUSH: PushCommand = PushCommand {
        name: "LPUSH",
        end: End::Head,
        only_existing: false,
    };

    pub const RPUSH: PushCommand = PushCommand {
        name: "RPUSH",
        end: End::Tail,
        only_existing: false,
    };

    pub const LPUSHX: PushCommand = PushCommand {
        name: "LPUSHX",
        end: End::Head,
        only_existing: true,
    };

    pub const RPUSHX: PushCommand = PushCommand {
        name: "RPUSHX",
        end: End::Tail,
        only_existing: true,
    };
}

impl Command for PushCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let values = extract_all(&args[1..])?;

        let list = if self.only_existing {
            match ctx.write::<List>(&key)? {
                Some(list) => list,
                None => return Ok(Reply::integer(0)),
            }
        } else {
            ctx.get_or_create::<List>(&key)?
        };

        for value in values {
            self.end.push(list, value);
        }
        Ok(Reply::integer(list.len() as i64))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// LPOP / RPOP commands - Remove and return the head or tail
///
/// Syntax: LPOP key
pub struct PopCommand {
    name: &'static str,
    end: End,
}

impl PopCommand {
    pub const LPOP: PopCommand = PopCommand {
        name: "LPOP",
        end: End::Head,
    };

    pub const RPOP: PopCommand = PopCommand {
        name: "RPOP",
        end: End::Tail,
    };
}

impl Command for PopCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;

        let value = match ctx.write::<List>(&key)? {
            Some(list) => self.end.pop(list),
            None => None,
        };
        ctx.cleanup(&key);
        Ok(Reply::optional(value))
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

/// LLEN command - Get the length of a list
///
/// Syntax: LLEN key
pub struct LLenCommand;

impl Command for LLenCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let len = ctx.read::<List>(&key)?.map(|list| list.len()).unwrap_or(0);
        Ok(Reply::integer(len as i64))
    }

    fn name(&self) -> &'static str {
        "LLEN"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// LINDEX command - Get an element by index
///
/// Syntax: LINDEX key index
pub struct LIndexCommand;

impl Command for LIndexCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let index = extract_integer(&args[1])?;

        let value = ctx.read::<List>(&key)?.and_then(|list| {
            resolve_index(index, list.len()).and_then(|i| list.get(i).cloned())
        });
        Ok(Reply::optional(value))
    }

    fn name(&self) -> &'static str {
        "LINDEX"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// LINSERT command - Insert a value before or after a pivot
///
/// Syntax: LINSERT key BEFORE|AFTER pivot value
///
/// Returns the new length, or -1 when the list or the pivot is missing.
pub struct LInsertCommand;

impl Command for LInsertCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let after = if is_keyword(&args[1], "BEFORE") {
            false
        } else if is_keyword(&args[1], "AFTER") {
            true
        } else {
            return Err(CacheError::syntax("LINSERT position must be BEFORE or AFTER"));
        };
        let pivot = extract_bytes(&args[2])?;
        let value = extract_bytes(&args[3])?;

        let list = match ctx.write::<List>(&key)? {
            Some(list) => list,
            None => return Ok(Reply::integer(-1)),
        };
        let position = match list.iter().position(|item| *item == pivot) {
            Some(position) => position,
            None => return Ok(Reply::integer(-1)),
        };

        list.insert(if after { position + 1 } else { position }, value);
        Ok(Reply::integer(list.len() as i64))
    }

    fn name(&self) -> &'static str {
        "LINSERT"
    }

    fn min_args(&self) -> usize {
        4
    }

    fn max_args(&self) -> Option<usize> {
        Some(4)
    }
}

/// LRANGE command - Get a range of elements from a list
///
/// Syntax: LRANGE key start stop
pub struct LRangeCommand;

impl Command for LRangeCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let start = extract_integer(&args[1])?;
        let stop = extract_integer(&args[2])?;

        let items = match ctx.read::<List>(&key)? {
            Some(list) => match normalize_range(start, stop, list.len()) {
                Some((from, to)) => list.range(from..=to).cloned().collect(),
                None => Vec::new(),
            },
            None => Vec::new(),
        };
        Ok(Reply::bulk_array(items))
    }

    fn name(&self) -> &'static str {
        "LRANGE"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// LREM command - Remove occurrences of a value
///
/// Syntax: LREM key count value
///
/// count > 0 removes from head to tail, count < 0 from tail to head,
/// count = 0 removes all occurrences.
pub struct LRemCommand;

impl Command for LRemCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let count = extract_integer(&args[1])?;
        let value = extract_bytes(&args[2])?;

        let removed = {
            let list = match ctx.write::<List>(&key)? {
                Some(list) => list,
                None => return Ok(Reply::integer(0)),
            };

            let limit = if count == 0 {
                usize::MAX
            } else {
                count.unsigned_abs() as usize
            };

            let mut positions: Vec<usize> = list
                .iter()
                .enumerate()
                .filter(|(_, item)| **item == value)
                .map(|(i, _)| i)
                .collect();
            if count < 0 {
                positions.reverse();
            }
            positions.truncate(limit);
            positions.sort_unstable_by(|a, b| b.cmp(a));

            for i in &positions {
                list.remove(*i);
            }
            positions.len()
        };

        ctx.cleanup(&key);
        Ok(Reply::integer(removed as i64))
    }

    fn name(&self) -> &'static str {
        "LREM"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// LSET command - Set the element at index
///
/// Syntax: LSET key index value
///
/// The index must fall in `[0, len)`; negative indices are out of range.
pub struct LSetCommand;

impl Command for LSetCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let index = extract_integer(&args[1])?;
        let value = extract_bytes(&args[2])?;

        let list = ctx.write::<List>(&key)?.ok_or(CacheError::NoSuchKey)?;
        let i = usize::try_from(index)
            .ok()
            .filter(|&i| i < list.len())
            .ok_or(CacheError::OutOfRange)?;
        list[i] = value;
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        "LSET"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// LTRIM command - Keep only the elements in an inclusive range
///
/// Syntax: LTRIM key start stop
pub struct LTrimCommand;

impl Command for LTrimCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let start = extract_integer(&args[1])?;
        let stop = extract_integer(&args[2])?;

        if let Some(list) = ctx.write::<List>(&key)? {
            match normalize_range(start, stop, list.len()) {
                Some((from, to)) => {
                    list.truncate(to + 1);
                    list.drain(..from);
                }
                None => list.clear(),
            }
        }
        ctx.cleanup(&key);
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        "LTRIM"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// RPOPLPUSH command - Move the tail of one list to the head of another
///
/// Syntax: RPOPLPUSH source destination
///
/// With source == destination the list is rotated. Without a destination
/// an absent source still answers nil.
pub struct RPopLPushCommand;

impl Command for RPopLPushCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let source = extract_bytes(&args[0])?;
        let Some(destination) = args.get(1) else {
            return match ctx.read::<List>(&source)? {
                Some(_) => Err(CacheError::WrongArity("rpoplpush".into())),
                None => Ok(Reply::Nil),
            };
        };
        let destination = extract_bytes(destination)?;

        // Both ends must hold lists before anything moves
        ctx.read::<List>(&destination)?;
        let value = match ctx.write::<List>(&source)?.and_then(|list| list.pop_back()) {
            Some(value) => value,
            None => return Ok(Reply::Nil),
        };

        ctx.get_or_create::<List>(&destination)?
            .push_front(value.clone());
        ctx.cleanup(&source);
        Ok(Reply::Bulk(value))
    }

    fn name(&self) -> &'static str {
        "RPOPLPUSH"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}
