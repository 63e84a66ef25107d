//! Bit commands on string values (GETBIT, SETBIT, BITCOUNT, BITOP)
//!
//! Bit 0 is the most significant bit of the first byte.

use super::{extract_bytes, extract_integer, is_keyword, normalize_range, Command, CommandContext};
use crate::error::{CacheError, Result};
use crate::protocol::{Arg, Reply};
use crate::store::Value;
use bytes::Bytes;

/// Highest addressable bit (512 MB string)
const MAX_BIT_OFFSET: u64 = 512 * 1024 * 1024 * 8 - 1;

fn parse_bit_offset(arg: &Arg) -> Result<usize> {
    let offset = extract_integer(arg)?;
    u64::try_from(offset)
        .ok()
        .filter(|o| *o <= MAX_BIT_OFFSET)
        .map(|o| o as usize)
        .ok_or(CacheError::NotAnInteger)
}

fn bit_at(bytes: &[u8], offset: usize) -> u8 {
    bytes
        .get(offset / 8)
        .map(|byte| (byte >> (7 - offset % 8)) & 1)
        .unwrap_or(0)
}

/// GETBIT command - Bit value at offset
///
/// Syntax: GETBIT key offset
pub struct GetBitCommand;

impl Command for GetBitCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let offset = parse_bit_offset(&args[1])?;

        let bit = ctx
            .read::<Bytes>(&key)?
            .map(|value| bit_at(value, offset))
            .unwrap_or(0);
        Ok(Reply::integer(i64::from(bit)))
    }

    fn name(&self) -> &'static str {
        "GETBIT"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// SETBIT command - Set or clear the bit at offset, returning the old bit
///
/// Syntax: SETBIT key offset 0|1
pub struct SetBitCommand;

impl Command for SetBitCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let offset = parse_bit_offset(&args[1])?;
        let on = match extract_integer(&args[2])? {
            0 => false,
            1 => true,
            _ => return Err(CacheError::NotAnInteger),
        };

        let slot = ctx.get_or_create::<Bytes>(&key)?;
        let mut buf = slot.to_vec();
        let byte = offset / 8;
        if buf.len() <= byte {
            buf.resize(byte + 1, 0);
        }

        let mask = 1u8 << (7 - offset % 8);
        let old = (buf[byte] & mask) != 0;
        if on {
            buf[byte] |= mask;
        } else {
            buf[byte] &= !mask;
        }
        *slot = Bytes::from(buf);

        Ok(Reply::integer(i64::from(old)))
    }

    fn name(&self) -> &'static str {
        "SETBIT"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// BITCOUNT command - Count set bits, optionally within a byte range
///
/// Syntax: BITCOUNT key [start end]
pub struct BitCountCommand;

impl Command for BitCountCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        if args.len() == 2 {
            return Err(CacheError::syntax("BITCOUNT needs both start and end"));
        }
        let key = extract_bytes(&args[0])?;
        let bounds = match args.len() {
            3 => Some((extract_integer(&args[1])?, extract_integer(&args[2])?)),
            _ => None,
        };

        let value = match ctx.read::<Bytes>(&key)? {
            Some(value) => value,
            None => return Ok(Reply::integer(0)),
        };

        let slice = match bounds {
            Some((start, end)) => match normalize_range(start, end, value.len()) {
                Some((from, to)) => &value[from..=to],
                None => &[][..],
            },
            None => &value[..],
        };

        let count: u32 = slice.iter().map(|byte| byte.count_ones()).sum();
        Ok(Reply::integer(i64::from(count)))
    }

    fn name(&self) -> &'static str {
        "BITCOUNT"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BitOp {
    And,
    Or,
    Xor,
    Not,
}

impl BitOp {
    fn parse(arg: &Arg) -> Result<Self> {
        [
            ("AND", BitOp::And),
            ("OR", BitOp::Or),
            ("XOR", BitOp::Xor),
            ("NOT", BitOp::Not),
        ]
        .into_iter()
        .find(|(word, _)| is_keyword(arg, word))
        .map(|(_, op)| op)
        .ok_or_else(|| CacheError::syntax("BITOP operation must be AND, OR, XOR or NOT"))
    }
}

/// BITOP command - Bitwise operation between strings, stored at destkey
///
/// Syntax: BITOP AND|OR|XOR|NOT destkey key [key ...]
///
/// Shorter inputs are zero-padded to the longest one. An empty result
/// deletes destkey.
pub struct BitOpCommand;

impl Command for BitOpCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let op = BitOp::parse(&args[0])?;
        let dest = extract_bytes(&args[1])?;
        if op == BitOp::Not && args.len() != 3 {
            return Err(CacheError::syntax("BITOP NOT must be called with a single source key"));
        }

        let mut sources = Vec::with_capacity(args.len() - 2);
        for arg in &args[2..] {
            let key = extract_bytes(arg)?;
            sources.push(ctx.read::<Bytes>(&key)?.cloned().unwrap_or_default());
        }

        let len = sources.iter().map(|s| s.len()).max().unwrap_or(0);
        let byte = |source: &Bytes, i: usize| source.get(i).copied().unwrap_or(0);
        let result: Vec<u8> = (0..len)
            .map(|i| {
                let mut bytes = sources.iter().map(|s| byte(s, i));
                let first = bytes.next().unwrap_or(0);
                match op {
                    BitOp::And => bytes.fold(first, |acc, b| acc & b),
                    BitOp::Or => bytes.fold(first, |acc, b| acc | b),
                    BitOp::Xor => bytes.fold(first, |acc, b| acc ^ b),
                    BitOp::Not => !first,
                }
            })
            .collect();

        let now = ctx.now();
        if result.is_empty() {
            ctx.db().remove(&dest, now);
        } else {
            ctx.db().set(dest, Value::String(Bytes::from(result)), now);
        }
        Ok(Reply::integer(len as i64))
    }

    fn name(&self) -> &'static str {
        "BITOP"
    }

    fn min_args(&self) -> usize {
        3
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::commands::string::{GetCommand, SetCommand};

    #[test]
    fn test_setbit_getbit() {
        let mut ctx = CommandContext::new();

        let result = SetBitCommand.execute(&mut ctx, &args!["bits", 7, 1]).unwrap();
        assert_eq!(result, Reply::integer(0));
        let result = SetBitCommand.execute(&mut ctx, &args!["bits", 7, 0]).unwrap();
        assert_eq!(result, Reply::integer(1));

        SetBitCommand.execute(&mut ctx, &args!["bits", 1, 1]).unwrap();
        assert_eq!(GetBitCommand.execute(&mut ctx, &args!["bits", 1]).unwrap(), Reply::integer(1));
        assert_eq!(GetBitCommand.execute(&mut ctx, &args!["bits", 100]).unwrap(), Reply::integer(0));
        assert_eq!(GetCommand.execute(&mut ctx, &args!["bits"]).unwrap(), Reply::bulk("@"));

        let result = SetBitCommand.execute(&mut ctx, &args!["bits", 1, 2]);
        assert_eq!(result, Err(CacheError::NotAnInteger));
        let result = GetBitCommand.execute(&mut ctx, &args!["bits", -1]);
        assert_eq!(result, Err(CacheError::NotAnInteger));
    }

    #[test]
    fn test_bitcount() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &args!["k", "foobar"]).unwrap();

        assert_eq!(BitCountCommand.execute(&mut ctx, &args!["k"]).unwrap(), Reply::integer(26));
        assert_eq!(BitCountCommand.execute(&mut ctx, &args!["k", 0, 0]).unwrap(), Reply::integer(4));
        assert_eq!(BitCountCommand.execute(&mut ctx, &args!["k", 1, 1]).unwrap(), Reply::integer(6));
        assert_eq!(BitCountCommand.execute(&mut ctx, &args!["none"]).unwrap(), Reply::integer(0));
        assert!(BitCountCommand.execute(&mut ctx, &args!["k", 0]).is_err());
    }

    #[test]
    fn test_bitop() {
        let mut ctx = CommandContext::new();
        SetCommand.execute(&mut ctx, &args!["a", "abc"]).unwrap();
        SetCommand.execute(&mut ctx, &args!["b", "a"]).unwrap();

        let result = BitOpCommand.execute(&mut ctx, &args!["AND", "dest", "a", "b"]).unwrap();
        assert_eq!(result, Reply::integer(3));
        assert_eq!(
            GetCommand.execute(&mut ctx, &args!["dest"]).unwrap(),
            Reply::bulk(Bytes::from_static(b"a\0\0"))
        );

        let result = BitOpCommand.execute(&mut ctx, &args!["or", "dest", "a", "b"]).unwrap();
        assert_eq!(result, Reply::integer(3));
        assert_eq!(GetCommand.execute(&mut ctx, &args!["dest"]).unwrap(), Reply::bulk("abc"));

        BitOpCommand.execute(&mut ctx, &args!["NOT", "dest", "b"]).unwrap();
        assert_eq!(
            GetCommand.execute(&mut ctx, &args!["dest"]).unwrap(),
            Reply::bulk(Bytes::from(vec![!b'a']))
        );

        let result = BitOpCommand.execute(&mut ctx, &args!["NOT", "dest", "a", "b"]);
        assert!(matches!(result, Err(CacheError::Syntax(_))));

        let result = BitOpCommand.execute(&mut ctx, &args!["XOR", "dest", "x", "y"]).unwrap();
        assert_eq!(result, Reply::integer(0));
        assert!(GetCommand.execute(&mut ctx, &args!["dest"]).unwrap().is_nil());
    }
}
