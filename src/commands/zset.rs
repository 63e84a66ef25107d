//! Sorted set commands (ZADD, ZCARD, ZCOUNT, ZINCRBY, ZLEXCOUNT, ZRANGE,
//! ZREVRANGE, ZRANGEBYSCORE, ZREVRANGEBYSCORE, ZRANGEBYLEX, ZREVRANGEBYLEX,
//! ZRANK, ZREVRANK, ZREM, ZREMRANGEBYRANK, ZREMRANGEBYSCORE, ZREMRANGEBYLEX,
//! ZSCORE)
//!
//! Members are ordered by score ascending, ties broken by member bytes.

use super::{extract_all, extract_bytes, extract_float, extract_integer, is_keyword};
use super::{normalize_range, Command, CommandContext};
use crate::error::{CacheError, Result};
use crate::protocol::{Arg, Reply};
use crate::store::{LexRange, ScoreRange, SortedSet};
use bytes::Bytes;

/// Flatten (member, score) pairs into a reply
fn range_reply(items: Vec<(Bytes, f64)>, with_scores: bool) -> Reply {
    let mut out = Vec::with_capacity(items.len() * if with_scores { 2 } else { 1 });
    for (member, score) in items {
        out.push(Reply::Bulk(member));
        if with_scores {
            out.push(Reply::Float(score));
        }
    }
    Reply::Array(out)
}

/// Remove `members` from the sorted set at `key`, deleting it if emptied
fn remove_members(ctx: &mut CommandContext, key: &Bytes, members: &[Bytes]) -> Result<i64> {
    let removed = match ctx.write::<SortedSet>(key)? {
        Some(zset) => members
            .iter()
            .filter(|member| zset.remove(member).is_some())
            .count(),
        None => 0,
    };
    ctx.cleanup(key);
    Ok(removed as i64)
}

/// Trailing options of the *BYSCORE and *BYLEX range commands
#[derive(Debug, Default, PartialEq)]
struct RangeOptions {
    with_scores: bool,
    limit: Option<(i64, i64)>,
}

impl RangeOptions {
    fn parse(args: &[Arg], allow_scores: bool) -> Result<Self> {
        let mut options = RangeOptions::default();
        let mut i = 0;
        while i < args.len() {
            if allow_scores && is_keyword(&args[i], "WITHSCORES") {
                options.with_scores = true;
                i += 1;
            } else if is_keyword(&args[i], "LIMIT") {
                let (offset, count) = match (args.get(i + 1), args.get(i + 2)) {
                    (Some(offset), Some(count)) => (extract_integer(offset)?, extract_integer(count)?),
                    _ => return Err(CacheError::syntax("LIMIT requires offset and count")),
                };
                options.limit = Some((offset, count));
                i += 3;
            } else {
                return Err(CacheError::syntax("unexpected range option"));
            }
        }
        Ok(options)
    }

    /// Skip `offset` items then keep `count` (all when negative)
    fn apply(&self, items: Vec<(Bytes, f64)>) -> Vec<(Bytes, f64)> {
        match self.limit {
            None => items,
            Some((offset, _)) if offset < 0 => Vec::new(),
            Some((offset, count)) => {
                let rest = items.into_iter().skip(offset as usize);
                if count < 0 {
                    rest.collect()
                } else {
                    rest.take(count as usize).collect()
                }
            }
        }
    }
}

/// ZADD command - Add members with scores, or update their scores
///
/// Syntax: ZADD key [NX|XX] [CH] score member [score member ...]
///
/// Returns the number of members added, or added plus updated with CH.
pub struct ZAddCommand;

impl Command for ZAddCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;

        let (mut nx, mut xx, mut ch) = (false, false, false);
        let mut i = 1;
        while i < args.len() {
            if is_keyword(&args[i], "NX") {
                nx = true;
            } else if is_keyword(&args[i], "XX") {
                xx = true;
            } else if is_keyword(&args[i], "CH") {
                ch = true;
            } else {
                break;
            }
            i += 1;
        }

        if nx && xx {
            return Err(CacheError::syntax("XX and NX options at the same time are not compatible"));
        }
        let pairs = &args[i..];
        if pairs.is_empty() || pairs.len() % 2 != 0 {
            return Err(CacheError::syntax("ZADD expects score/member pairs"));
        }
        let pairs = pairs
            .chunks(2)
            .map(|pair| Ok((extract_float(&pair[0])?, extract_bytes(&pair[1])?)))
            .collect::<Result<Vec<(f64, Bytes)>>>()?;

        let zset = ctx.get_or_create::<SortedSet>(&key)?;
        let (mut added, mut changed) = (0, 0);
        for (score, member) in pairs {
            match zset.score(&member) {
                Some(_) if nx => {}
                Some(old) => {
                    if old != score {
                        zset.insert(member, score);
                        changed += 1;
                    }
                }
                None if xx => {}
                None => {
                    zset.insert(member, score);
                    added += 1;
                }
            }
        }
        ctx.cleanup(&key);

        Ok(Reply::integer(if ch { added + changed } else { added }))
    }

    fn name(&self) -> &'static str {
        "ZADD"
    }

    fn min_args(&self) -> usize {
        3
    }
}

/// ZCARD command - Number of members
///
/// Syntax: ZCARD key
pub struct ZCardCommand;

impl Command for ZCardCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let len = ctx.read::<SortedSet>(&key)?.map(|z| z.len()).unwrap_or(0);
        Ok(Reply::integer(len as i64))
    }

    fn name(&self) -> &'static str {
        "ZCARD"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// ZCOUNT command - Number of members within a score range
///
/// Syntax: ZCOUNT key min max
pub struct ZCountCommand;

impl Command for ZCountCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let range = ScoreRange::parse(&extract_bytes(&args[1])?, &extract_bytes(&args[2])?)?;

        let count = ctx
            .read::<SortedSet>(&key)?
            .map(|z| z.iter().filter(|(_, score)| range.contains(*score)).count())
            .unwrap_or(0);
        Ok(Reply::integer(count as i64))
    }

    fn name(&self) -> &'static str {
        "ZCOUNT"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// ZLEXCOUNT command - Number of members within a lexicographic range
///
/// Syntax: ZLEXCOUNT key min max
pub struct ZLexCountCommand;

impl Command for ZLexCountCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let range = LexRange::parse(&extract_bytes(&args[1])?, &extract_bytes(&args[2])?)?;

        let count = ctx
            .read::<SortedSet>(&key)?
            .map(|z| z.iter().filter(|(member, _)| range.contains(member)).count())
            .unwrap_or(0);
        Ok(Reply::integer(count as i64))
    }

    fn name(&self) -> &'static str {
        "ZLEXCOUNT"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// ZINCRBY command - Increment the score of a member
///
/// Syntax: ZINCRBY key increment member
pub struct ZIncrByCommand;

impl Command for ZIncrByCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let increment = extract_float(&args[1])?;
        let member = extract_bytes(&args[2])?;

        let zset = ctx.get_or_create::<SortedSet>(&key)?;
        let score = zset.score(&member).unwrap_or(0.0) + increment;
        if score.is_nan() {
            ctx.cleanup(&key);
            return Err(CacheError::NotAFloat);
        }
        zset.insert(member, score);
        Ok(Reply::float(score))
    }

    fn name(&self) -> &'static str {
        "ZINCRBY"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// ZSCORE command - Score of a member
///
/// Syntax: ZSCORE key member
pub struct ZScoreCommand;

impl Command for ZScoreCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let member = extract_bytes(&args[1])?;

        let score = ctx.read::<SortedSet>(&key)?.and_then(|z| z.score(&member));
        Ok(score.map(Reply::float).unwrap_or(Reply::Nil))
    }

    fn name(&self) -> &'static str {
        "ZSCORE"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// ZRANGE / ZREVRANGE commands - Members by rank
///
/// Syntax: ZRANGE key start stop [WITHSCORES]
pub struct ZRangeCommand {
    name: &'static str,
    reverse: bool,
}

impl ZRangeCommand {
    pub const ZRANGE: ZRangeCommand = ZRangeCommand {
        name: "ZRANGE",
        reverse: false,
    };

    pub const ZREVRANGE: ZRangeCommand = ZRangeCommand {
        name: "ZREVRANGE",
        reverse: true,
    };
}

impl Command for ZRangeCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let start = extract_integer(&args[1])?;
        let stop = extract_integer(&args[2])?;
        let with_scores = match args.get(3) {
            Some(opt) if is_keyword(opt, "WITHSCORES") => true,
            Some(_) => return Err(CacheError::syntax("unexpected range option")),
            None => false,
        };

        let mut items = ctx.read::<SortedSet>(&key)?.map(|z| z.sorted()).unwrap_or_default();
        if self.reverse {
            items.reverse();
        }
        let items: Vec<(Bytes, f64)> = match normalize_range(start, stop, items.len()) {
            Some((from, to)) => items.drain(from..=to).collect(),
            None => Vec::new(),
        };
        Ok(range_reply(items, with_scores))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(4)
    }
}

/// ZRANGEBYSCORE / ZREVRANGEBYSCORE commands - Members by score
///
/// Syntax: ZRANGEBYSCORE key min max [WITHSCORES] [LIMIT offset count]
/// Syntax: ZREVRANGEBYSCORE key max min [WITHSCORES] [LIMIT offset count]
pub struct ZRangeByScoreCommand {
    name: &'static str,
    reverse: bool,
}

impl ZRangeByScoreCommand {
    pub const ZRANGEBYSCORE: ZRangeByScoreCommand = ZRangeByScoreCommand {
        name: "ZRANGEBYSCORE",
        reverse: false,
    };

    pub const ZREVRANGEBYSCORE: ZRangeByScoreCommand = ZRangeByScoreCommand {
        name: "ZREVRANGEBYSCORE",
        reverse: true,
    };
}

impl Command for ZRangeByScoreCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let (min, max) = if self.reverse { (&args[2], &args[1]) } else { (&args[1], &args[2]) };
        let range = ScoreRange::parse(&extract_bytes(min)?, &extract_bytes(max)?)?;
        let options = RangeOptions::parse(&args[3..], true)?;

        let mut items = ctx
            .read::<SortedSet>(&key)?
            .map(|z| z.range_by_score(&range))
            .unwrap_or_default();
        if self.reverse {
            items.reverse();
        }
        Ok(range_reply(options.apply(items), options.with_scores))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        3
    }
}

/// ZRANGEBYLEX / ZREVRANGEBYLEX commands - Members by lexicographic range
///
/// Syntax: ZRANGEBYLEX key min max [LIMIT offset count]
/// Syntax: ZREVRANGEBYLEX key max min [LIMIT offset count]
pub struct ZRangeByLexCommand {
    name: &'static str,
    reverse: bool,
}

impl ZRangeByLexCommand {
    pub const ZRANGEBYLEX: ZRangeByLexCommand = ZRangeByLexCommand {
        name: "ZRANGEBYLEX",
        reverse: false,
    };

    pub const ZREVRANGEBYLEX: ZRangeByLexCommand = ZRangeByLexCommand {
        name: "ZREVRANGEBYLEX",
        reverse: true,
    };
}

impl Command for ZRangeByLexCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let (min, max) = if self.reverse { (&args[2], &args[1]) } else { (&args[1], &args[2]) };
        let range = LexRange::parse(&extract_bytes(min)?, &extract_bytes(max)?)?;
        let options = RangeOptions::parse(&args[3..], false)?;

        let mut items = ctx
            .read::<SortedSet>(&key)?
            .map(|z| z.range_by_lex(&range))
            .unwrap_or_default();
        if self.reverse {
            items.reverse();
        }
        Ok(range_reply(options.apply(items), false))
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn min_args(&self) -> usize {
        3
    }
}

/// ZRANK / ZREVRANK commands - Rank of a member
///
/// Syntax: ZRANK key member
pub struct ZRankCommand {
    name: &'static str,
    reverse: bool,
}

impl ZRankCommand {
    pub const ZRANK: ZRankCommand = ZRankCommand {
        name: "ZRANK",
        reverse: false,
    };

    pub const ZREVRANK: ZRankCommand = ZRankCommand {
        name: "ZREVRANK",
        reverse: true,
    };
}

impl Command for ZRankCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let member = extract_bytes(&args[1])?;

        let rank = ctx.read::<SortedSet>(&key)?.and_then(|z| {
            z.rank(&member)
                .map(|rank| if self.reverse { z.len() - 1 - rank } else { rank })
        });
        Ok(rank.map(|r| Reply::integer(r as i64)).unwrap_or(Reply::Nil))
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

/// ZREM command - Remove members
///
/// Syntax: ZREM key member [member ...]
pub struct ZRemCommand;

impl Command for ZRemCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let members = extract_all(&args[1..])?;
        remove_members(ctx, &key, &members).map(Reply::integer)
    }

    fn name(&self) -> &'static str {
        "ZREM"
    }

    fn min_args(&self) -> usize {
        2
    }
}

/// ZREMRANGEBYRANK command - Remove members within a rank range
///
/// Syntax: ZREMRANGEBYRANK key start stop
pub struct ZRemRangeByRankCommand;

impl Command for ZRemRangeByRankCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let start = extract_integer(&args[1])?;
        let stop = extract_integer(&args[2])?;

        let sorted = ctx.read::<SortedSet>(&key)?.map(|z| z.sorted()).unwrap_or_default();
        let doomed: Vec<Bytes> = match normalize_range(start, stop, sorted.len()) {
            Some((from, to)) => sorted[from..=to].iter().map(|(m, _)| m.clone()).collect(),
            None => Vec::new(),
        };
        remove_members(ctx, &key, &doomed).map(Reply::integer)
    }

    fn name(&self) -> &'static str {
        "ZREMRANGEBYRANK"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// ZREMRANGEBYSCORE command - Remove members within a score range
///
/// Syntax: ZREMRANGEBYSCORE key min max
pub struct ZRemRangeByScoreCommand;

impl Command for ZRemRangeByScoreCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let range = ScoreRange::parse(&extract_bytes(&args[1])?, &extract_bytes(&args[2])?)?;

        let doomed: Vec<Bytes> = ctx
            .read::<SortedSet>(&key)?
            .map(|z| z.range_by_score(&range).into_iter().map(|(m, _)| m).collect())
            .unwrap_or_default();
        remove_members(ctx, &key, &doomed).map(Reply::integer)
    }

    fn name(&self) -> &'static str {
        "ZREMRANGEBYSCORE"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}

/// ZREMRANGEBYLEX command - Remove members within a lexicographic range
///
/// Syntax: ZREMRANGEBYLEX key min max
pub struct ZRemRangeByLexCommand;

impl Command for ZRemRangeByLexCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let key = extract_bytes(&args[0])?;
        let range = LexRange::parse(&extract_bytes(&args[1])?, &extract_bytes(&args[2])?)?;

        let doomed: Vec<Bytes> = ctx
            .read::<SortedSet>(&key)?
            .map(|z| z.range_by_lex(&range).into_iter().map(|(m, _)| m).collect())
            .unwrap_or_default();
        remove_members(ctx, &key, &doomed).map(Reply::integer)
    }

    fn name(&self) -> &'static str {
        "ZREMRANGEBYLEX"
    }

    fn min_args(&self) -> usize {
        3
    }

    fn max_args(&self) -> Option<usize> {
        Some(3)
    }
}
