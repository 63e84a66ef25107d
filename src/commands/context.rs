//! Command execution context

use crate::clock::{Clock, SystemClock};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::store::{Database, Keyspace, Typed};
use bytes::Bytes;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

/// Context provided to commands during execution
///
/// Owns everything one engine instance needs: the databases, the time
/// source and the random generator. All typed access to keys goes through
/// `read`, `write` and `get_or_create`, which is where a key's kind is
/// checked against what the command expects.
pub struct CommandContext {
    /// All databases plus the selected index
    pub keyspace: Keyspace,

    /// Random source for SPOP, SRANDMEMBER and RANDOMKEY
    pub rng: StdRng,

    /// Time of the last SAVE/BGSAVE (milliseconds since epoch)
    pub last_save: u64,

    clock: Arc<dyn Clock>,
}

impl CommandContext {
    /// Create a context with default configuration and the wall clock
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default(), Arc::new(SystemClock))
    }

    /// Create a context with default configuration and a custom clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::with_config(&EngineConfig::default(), clock)
    }

    /// Create a context from a configuration
    pub fn with_config(config: &EngineConfig, clock: Arc<dyn Clock>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        CommandContext {
            keyspace: Keyspace::new(config.databases),
            rng,
            last_save: clock.now_ms(),
            clock,
        }
    }

    /// Current time in milliseconds
    pub fn now(&self) -> u64 {
        self.clock.now_ms()
    }

    /// The selected database
    pub fn db(&mut self) -> &mut Database {
        self.keyspace.current()
    }

    /// Borrow the value at `key` as `T`
    ///
    /// `Ok(None)` when the key is absent, `WrongType` when it holds another
    /// kind.
    pub fn read<T: Typed>(&mut self, key: &[u8]) -> Result<Option<&T>> {
        let now = self.now();
        match self.keyspace.current().get(key, now) {
            Some(value) => value.expect::<T>().map(Some),
            None => Ok(None),
        }
    }

    /// Mutably borrow the value at `key` as `T`, without creating it
    pub fn write<T: Typed>(&mut self, key: &[u8]) -> Result<Option<&mut T>> {
        let now = self.now();
        match self.keyspace.current().get_mut(key, now) {
            Some(value) => value.expect_mut::<T>().map(Some),
            None => Ok(None),
        }
    }

    /// Mutably borrow the value at `key` as `T`, creating an empty one if
    /// the key is absent
    ///
    /// Callers that may end up adding nothing must call `cleanup` afterwards.
    pub fn get_or_create<T: Typed>(&mut self, key: &Bytes) -> Result<&mut T> {
        let now = self.now();
        self.keyspace
            .current()
            .get_or_insert_with(key, now, || T::default().into_value())
            .expect_mut::<T>()
    }

    /// Delete `key` if it is a collection left without elements
    pub fn cleanup(&mut self, key: &[u8]) {
        self.keyspace.current().remove_if_empty(key);
    }
}

impl Default for CommandContext {
    fn default() -> Self {
        Self::new()
    }
}
