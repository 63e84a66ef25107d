//! Command registry
//!
//! Centralized table of every emulated command plus the names the engine
//! knows about but deliberately does not emulate.

use super::{
    admin, bitmap, connection, counter, hash, key, list, search, set, string, ttl, zset, Command,
};
use std::collections::HashMap;
use std::sync::Arc;

/// Commands of the emulated store that this engine rejects (or ignores when
/// bypass is enabled): clustering, geo, hyperloglog, scans, blocking pops,
/// pub/sub, scripting, server internals and transactions.
pub const UNSUPPORTED_COMMANDS: &[&str] = &[
    "cluster",
    "readonly",
    "readwrite",
    "geoadd",
    "geohash",
    "geopos",
    "geodist",
    "georadius",
    "georadiusbymember",
    "hscan",
    "pfadd",
    "pfcount",
    "pfmerge",
    "migrate",
    "object",
    "scan",
    "sort",
    "wait",
    "blpop",
    "brpop",
    "brpoplpush",
    "psubscribe",
    "pubsub",
    "publish",
    "punsubscribe",
    "subscribe",
    "unsubscribe",
    "script",
    "eval",
    "evalsha",
    "bgrewriteaof",
    "client",
    "config",
    "debug",
    "monitor",
    "shutdown",
    "slaveof",
    "slowlog",
    "sync",
    "sscan",
    "zinterstore",
    "zunionstore",
    "zscan",
    "bitfield",
    "watch",
    "unwatch",
];

/// Registry of all available commands
pub struct CommandRegistry {
    commands: HashMap<String, Arc<dyn Command>>,
}

impl CommandRegistry {
    /// Create a new command registry and register all commands
    pub fn new() -> Self {
        let mut registry = CommandRegistry {
            commands: HashMap::new(),
        };

        // Register string commands
        registry.register(Arc::new(string::SetCommand));
        registry.register(Arc::new(string::GetCommand));
        registry.register(Arc::new(string::GetSetCommand));
        registry.register(Arc::new(string::SetNxCommand));
        registry.register(Arc::new(string::SetExCommand::SECONDS));
        registry.register(Arc::new(string::SetExCommand::MILLISECONDS));
        registry.register(Arc::new(string::AppendCommand));
        registry.register(Arc::new(string::StrLenCommand));
        registry.register(Arc::new(string::MGetCommand));
        registry.register(Arc::new(string::MSetCommand));
        registry.register(Arc::new(string::MSetNxCommand));
        registry.register(Arc::new(string::GetRangeCommand));
        registry.register(Arc::new(string::SetRangeCommand));

        // Register counter commands
        registry.register(Arc::new(counter::IncrCommand));
        registry.register(Arc::new(counter::IncrByCommand));
        registry.register(Arc::new(counter::DecrCommand));
        registry.register(Arc::new(counter::DecrByCommand));
        registry.register(Arc::new(counter::IncrByFloatCommand));

        // Register bit commands
        registry.register(Arc::new(bitmap::GetBitCommand));
        registry.register(Arc::new(bitmap::SetBitCommand));
        registry.register(Arc::new(bitmap::BitCountCommand));
        registry.register(Arc::new(bitmap::BitOpCommand));

        // Register key commands
        registry.register(Arc::new(key::DelCommand::DEL));
        registry.register(Arc::new(key::DelCommand::UNLINK));
        registry.register(Arc::new(key::ExistsCommand));
        registry.register(Arc::new(key::TypeCommand));
        registry.register(Arc::new(key::TouchCommand));
        registry.register(Arc::new(key::RenameCommand));
        registry.register(Arc::new(key::RenameNxCommand));
        registry.register(Arc::new(key::MoveCommand));
        registry.register(Arc::new(key::DumpCommand));
        registry.register(Arc::new(key::RestoreCommand));

        // Register TTL commands
        registry.register(Arc::new(ttl::ExpireCommand::EXPIRE));
        registry.register(Arc::new(ttl::ExpireCommand::PEXPIRE));
        registry.register(Arc::new(ttl::ExpireCommand::EXPIREAT));
        registry.register(Arc::new(ttl::ExpireCommand::PEXPIREAT));
        registry.register(Arc::new(ttl::PersistCommand));
        registry.register(Arc::new(ttl::TtlCommand::TTL));
        registry.register(Arc::new(ttl::TtlCommand::PTTL));

        // Register hash commands
        registry.register(Arc::new(hash::HSetCommand));
        registry.register(Arc::new(hash::HMSetCommand));
        registry.register(Arc::new(hash::HSetNxCommand));
        registry.register(Arc::new(hash::HGetCommand));
        registry.register(Arc::new(hash::HMGetCommand));
        registry.register(Arc::new(hash::HDelCommand));
        registry.register(Arc::new(hash::HExistsCommand));
        registry.register(Arc::new(hash::HIncrByCommand));
        registry.register(Arc::new(hash::HIncrByFloatCommand));
        registry.register(Arc::new(hash::HKeysCommand));
        registry.register(Arc::new(hash::HValsCommand));
        registry.register(Arc::new(hash::HGetAllCommand));
        registry.register(Arc::new(hash::HLenCommand));
        registry.register(Arc::new(hash::HStrLenCommand));

        // Register list commands
        registry.register(Arc::new(list::PushCommand::LPUSH));
        registry.register(Arc::new(list::PushCommand::RPUSH));
        registry.register(Arc::new(list::PushCommand::LPUSHX));
        registry.register(Arc::new(list::PushCommand::RPUSHX));
        registry.register(Arc::new(list::PopCommand::LPOP));
        registry.register(Arc::new(list::PopCommand::RPOP));
        registry.register(Arc::new(list::LLenCommand));
        registry.register(Arc::new(list::LIndexCommand));
        registry.register(Arc::new(list::LInsertCommand));
        registry.register(Arc::new(list::LRangeCommand));
        registry.register(Arc::new(list::LRemCommand));
        registry.register(Arc::new(list::LSetCommand));
        registry.register(Arc::new(list::LTrimCommand));
        registry.register(Arc::new(list::RPopLPushCommand));

        // Register set commands
        registry.register(Arc::new(set::SAddCommand));
        registry.register(Arc::new(set::SRemCommand));
        registry.register(Arc::new(set::SCardCommand));
        registry.register(Arc::new(set::SIsMemberCommand));
        registry.register(Arc::new(set::SMembersCommand));
        registry.register(Arc::new(set::SetAlgebraCommand::SDIFF));
        registry.register(Arc::new(set::SetAlgebraCommand::SINTER));
        registry.register(Arc::new(set::SetAlgebraCommand::SUNION));
        registry.register(Arc::new(set::SetAlgebraStoreCommand::SDIFFSTORE));
        registry.register(Arc::new(set::SetAlgebraStoreCommand::SINTERSTORE));
        registry.register(Arc::new(set::SetAlgebraStoreCommand::SUNIONSTORE));
        registry.register(Arc::new(set::SMoveCommand));
        registry.register(Arc::new(set::SPopCommand));
        registry.register(Arc::new(set::SRandMemberCommand));

        // Register sorted set commands
        registry.register(Arc::new(zset::ZAddCommand));
        registry.register(Arc::new(zset::ZCardCommand));
        registry.register(Arc::new(zset::ZCountCommand));
        registry.register(Arc::new(zset::ZLexCountCommand));
        registry.register(Arc::new(zset::ZIncrByCommand));
        registry.register(Arc::new(zset::ZScoreCommand));
        registry.register(Arc::new(zset::ZRangeCommand::ZRANGE));
        registry.register(Arc::new(zset::ZRangeCommand::ZREVRANGE));
        registry.register(Arc::new(zset::ZRangeByScoreCommand::ZRANGEBYSCORE));
        registry.register(Arc::new(zset::ZRangeByScoreCommand::ZREVRANGEBYSCORE));
        registry.register(Arc::new(zset::ZRangeByLexCommand::ZRANGEBYLEX));
        registry.register(Arc::new(zset::ZRangeByLexCommand::ZREVRANGEBYLEX));
        registry.register(Arc::new(zset::ZRankCommand::ZRANK));
        registry.register(Arc::new(zset::ZRankCommand::ZREVRANK));
        registry.register(Arc::new(zset::ZRemCommand));
        registry.register(Arc::new(zset::ZRemRangeByRankCommand));
        registry.register(Arc::new(zset::ZRemRangeByScoreCommand));
        registry.register(Arc::new(zset::ZRemRangeByLexCommand));

        // Register search commands
        registry.register(Arc::new(search::KeysCommand));
        registry.register(Arc::new(search::RandomKeyCommand));

        // Register admin commands
        registry.register(Arc::new(admin::SelectCommand));
        registry.register(Arc::new(admin::SwapDbCommand));
        registry.register(Arc::new(admin::FlushDbCommand));
        registry.register(Arc::new(admin::FlushAllCommand));
        registry.register(Arc::new(admin::DbSizeCommand));
        registry.register(Arc::new(admin::InfoCommand));
        registry.register(Arc::new(admin::TimeCommand));
        registry.register(Arc::new(admin::LastSaveCommand));
        registry.register(Arc::new(admin::SaveCommand::SAVE));
        registry.register(Arc::new(admin::SaveCommand::BGSAVE));
        registry.register(Arc::new(admin::RoleCommand));

        // Register connection commands
        registry.register(Arc::new(connection::AuthCommand));
        registry.register(Arc::new(connection::EchoCommand));
        registry.register(Arc::new(connection::PingCommand));

        registry
    }

    /// Register a command
    fn register(&mut self, command: Arc<dyn Command>) {
        let name = command.name().to_uppercase();
        self.commands.insert(name, command);
    }

    /// Get a command by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands.get(&name.to_uppercase()).cloned()
    }

    /// Check if a command exists
    pub fn has_command(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_uppercase())
    }

    /// Check if a command is known but not emulated (case-insensitive)
    pub fn is_unsupported(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        UNSUPPORTED_COMMANDS.contains(&name.as_str())
    }

    /// Get all command names
    pub fn command_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}
