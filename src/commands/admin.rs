//! Admin commands (SELECT, SWAPDB, FLUSHDB, FLUSHALL, DBSIZE, INFO, TIME,
//! LASTSAVE, SAVE, BGSAVE, ROLE)

use super::{extract_bytes, extract_integer, Command, CommandContext};
use crate::error::{CacheError, Result};
use crate::protocol::{Arg, Reply};
use std::fmt::Write as _;
use tracing::info;

/// SELECT command - Change the selected database
///
/// Syntax: SELECT index
pub struct SelectCommand;

impl Command for SelectCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let index = extract_integer(&args[0]).map_err(|_| CacheError::InvalidDbIndex)?;
        ctx.keyspace.select(index)?;
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        "SELECT"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// SWAPDB command - Exchange the contents of two databases
///
/// Syntax: SWAPDB index1 index2
pub struct SwapDbCommand;

impl Command for SwapDbCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let a = extract_integer(&args[0]).map_err(|_| CacheError::InvalidDbIndex)?;
        let b = extract_integer(&args[1]).map_err(|_| CacheError::InvalidDbIndex)?;
        ctx.keyspace.swap(a, b)?;
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        "SWAPDB"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// FLUSHDB command - Remove all keys from the selected database
///
/// Syntax: FLUSHDB
pub struct FlushDbCommand;

impl Command for FlushDbCommand {
    fn execute(&self, ctx: &mut CommandContext, _args: &[Arg]) -> Result<Reply> {
        ctx.db().clear();
        info!("Flushed database {}", ctx.keyspace.current_index());
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        "FLUSHDB"
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// FLUSHALL command - Remove all keys from every database
///
/// Syntax: FLUSHALL
///
/// Database 0 is selected afterwards.
pub struct FlushAllCommand;

impl Command for FlushAllCommand {
    fn execute(&self, ctx: &mut CommandContext, _args: &[Arg]) -> Result<Reply> {
        ctx.keyspace.flush_all();
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        "FLUSHALL"
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// DBSIZE command - Number of live keys in the selected database
///
/// Syntax: DBSIZE
pub struct DbSizeCommand;

impl Command for DbSizeCommand {
    fn execute(&self, ctx: &mut CommandContext, _args: &[Arg]) -> Result<Reply> {
        let now = ctx.now();
        ctx.db().purge_expired(now);
        Ok(Reply::integer(ctx.db().len() as i64))
    }

    fn name(&self) -> &'static str {
        "DBSIZE"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

/// INFO command - Get information and statistics about the engine
///
/// Syntax: INFO [section]
///
/// Known sections are `server` and `keyspace`; `all`, `default` and
/// `everything` return both. Anything else yields an empty report.
pub struct InfoCommand;

impl Command for InfoCommand {
    fn execute(&self, ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        let section = match args.first() {
            Some(arg) => String::from_utf8_lossy(&extract_bytes(arg)?).to_lowercase(),
            None => "default".to_string(),
        };
        let all = matches!(section.as_str(), "all" | "default" | "everything");

        let mut info = String::new();
        if all || section == "server" {
            let _ = write!(
                info,
                "# Server\r\n\
                memcache_rs_version:{}\r\n\
                mode:embedded\r\n\
                os:{}\r\n\
                arch:{}\r\n\
                databases:{}\r\n",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH,
                ctx.keyspace.len(),
            );
        }
        if all {
            info.push_str("\r\n");
        }
        if all || section == "keyspace" {
            let now = ctx.now();
            info.push_str("# Keyspace\r\n");
            for index in 0..ctx.keyspace.len() {
                let Some(db) = ctx.keyspace.db(index) else {
                    continue;
                };
                let stats = db.stats(now);
                if stats.active_keys > 0 {
                    let _ = write!(
                        info,
                        "db{}:keys={},expires={}\r\n",
                        index, stats.active_keys, stats.volatile_keys
                    );
                }
            }
        }

        Ok(Reply::bulk(info))
    }

    fn name(&self) -> &'static str {
        "INFO"
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// TIME command - Current time as [seconds, microseconds]
///
/// Syntax: TIME
pub struct TimeCommand;

impl Command for TimeCommand {
    fn execute(&self, ctx: &mut CommandContext, _args: &[Arg]) -> Result<Reply> {
        let now = ctx.now();
        Ok(Reply::array(vec![
            Reply::integer((now / 1000) as i64),
            Reply::integer(((now % 1000) * 1000) as i64),
        ]))
    }

    fn name(&self) -> &'static str {
        "TIME"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

/// LASTSAVE command - Unix time in seconds of the last SAVE
///
/// Syntax: LASTSAVE
pub struct LastSaveCommand;

impl Command for LastSaveCommand {
    fn execute(&self, ctx: &mut CommandContext, _args: &[Arg]) -> Result<Reply> {
        Ok(Reply::integer((ctx.last_save / 1000) as i64))
    }

    fn name(&self) -> &'static str {
        "LASTSAVE"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

/// SAVE / BGSAVE commands - Record a save point
///
/// Syntax: SAVE
///
/// Nothing is persisted; only the LASTSAVE timestamp moves.
pub struct SaveCommand {
    name: &'static str,
}

impl SaveCommand {
    pub const SAVE: SaveCommand = SaveCommand { name: "SAVE" };
    pub const BGSAVE: SaveCommand = SaveCommand { name: "BGSAVE" };
}

impl Command for SaveCommand {
    fn execute(&self, ctx: &mut CommandContext, _args: &[Arg]) -> Result<Reply> {
        ctx.last_save = ctx.now();
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}

/// ROLE command - Replication role, always a master with no replicas
///
/// Syntax: ROLE
pub struct RoleCommand;

impl Command for RoleCommand {
    fn execute(&self, _ctx: &mut CommandContext, _args: &[Arg]) -> Result<Reply> {
        Ok(Reply::array(vec![
            Reply::bulk("master"),
            Reply::integer(0),
            Reply::Nil,
        ]))
    }

    fn name(&self) -> &'static str {
        "ROLE"
    }

    fn max_args(&self) -> Option<usize> {
        Some(0)
    }
}
