//! Command dispatcher
//!
//! Routes named commands to the appropriate handler.
//! This module provides loose coupling between the client adapter and command implementations.
//! MULTI, EXEC and DISCARD are handled here since they act on the dispatch
//! queue rather than on the keyspace.

mod transaction;

use crate::clock::{Clock, SystemClock};
use crate::commands::{Command, CommandContext, CommandRegistry};
use crate::config::EngineConfig;
use crate::error::{CacheError, Result};
use crate::protocol::{Arg, Reply};
use std::sync::Arc;
use tracing::{debug, warn};
use transaction::Transaction;

/// Command dispatcher
///
/// Resolves a command name, validates the argument count, applies the
/// unsupported-command gate and runs the handler against the engine state.
pub struct Dispatcher {
    /// Command registry
    registry: CommandRegistry,

    /// Command execution context
    context: CommandContext,

    /// Accept unsupported commands as no-ops
    bypass_unsupported: bool,

    /// Open MULTI block, if any
    transaction: Option<Transaction>,
}

impl Dispatcher {
    /// Create a new dispatcher with default configuration
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default(), Arc::new(SystemClock))
    }

    /// Create a dispatcher from a configuration and a time source
    pub fn with_config(config: &EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Dispatcher {
            registry: CommandRegistry::new(),
            context: CommandContext::with_config(config, clock),
            bypass_unsupported: config.bypass_unsupported,
            transaction: None,
        }
    }

    /// Dispatch a command
    ///
    /// The name is case-insensitive. Commands the emulated store has but
    /// this engine does not emulate return nil when bypass is enabled and
    /// fail with `UnsupportedCommand` otherwise. Inside MULTI, valid
    /// commands are queued and answer `QUEUED`.
    pub fn dispatch(&mut self, name: &str, args: &[Arg]) -> Result<Reply> {
        debug!("Dispatching command: {} ({} args)", name, args.len());

        match name.to_ascii_lowercase().as_str() {
            "multi" => return self.multi(args),
            "exec" => return self.exec(args),
            "discard" => return self.discard(args),
            _ => {}
        }

        let command = match self.resolve(name, args) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => return Ok(Reply::Nil),
            Err(e) => {
                if let Some(transaction) = self.transaction.as_mut() {
                    transaction.abort();
                }
                return Err(e);
            }
        };

        if let Some(transaction) = self.transaction.as_mut() {
            transaction.push(command, args);
            return Ok(Reply::status("QUEUED"));
        }

        // Execute the command
        command.execute(&mut self.context, args)
    }

    /// Look up a command and validate its argument count
    ///
    /// `Ok(None)` means an unsupported command was bypassed.
    fn resolve(&self, name: &str, args: &[Arg]) -> Result<Option<Arc<dyn Command>>> {
        // Look up the command
        let command = match self.registry.get(name) {
            Some(cmd) => cmd,
            None if self.registry.is_unsupported(name) => {
                if self.bypass_unsupported {
                    debug!("Bypassing unsupported command: {}", name);
                    return Ok(None);
                }
                warn!("Unsupported command: {}", name);
                return Err(CacheError::UnsupportedCommand(name.to_lowercase()));
            }
            None => {
                warn!("Unknown command: {}", name);
                return Err(CacheError::UnknownCommand(name.to_lowercase()));
            }
        };

        // Validate argument count
        let too_many = command.max_args().map_or(false, |max| args.len() > max);
        if args.len() < command.min_args() || too_many {
            return Err(CacheError::WrongArity(name.to_lowercase()));
        }

        Ok(Some(command))
    }

    /// MULTI - Start queueing commands
    fn multi(&mut self, args: &[Arg]) -> Result<Reply> {
        if !args.is_empty() {
            return Err(CacheError::WrongArity("multi".into()));
        }
        if self.transaction.is_some() {
            return Err(CacheError::NestedMulti);
        }
        self.transaction = Some(Transaction::default());
        Ok(Reply::ok())
    }

    /// EXEC - Run the queued commands in order
    ///
    /// Each failure becomes a `Reply::Error` element; later commands still run.
    fn exec(&mut self, args: &[Arg]) -> Result<Reply> {
        if !args.is_empty() {
            if let Some(transaction) = self.transaction.as_mut() {
                transaction.abort();
            }
            return Err(CacheError::WrongArity("exec".into()));
        }
        let transaction = self
            .transaction
            .take()
            .ok_or(CacheError::WithoutMulti("EXEC"))?;
        if transaction.is_aborted() {
            warn!("Transaction aborted, {} queued commands dropped", transaction.len());
            return Err(CacheError::ExecAbort);
        }

        debug!("Executing transaction of {} commands", transaction.len());
        let replies = transaction
            .into_queue()
            .into_iter()
            .map(|queued| {
                queued
                    .command
                    .execute(&mut self.context, &queued.args)
                    .unwrap_or_else(Reply::Error)
            })
            .collect();
        Ok(Reply::Array(replies))
    }

    /// DISCARD - Drop the queued commands
    fn discard(&mut self, args: &[Arg]) -> Result<Reply> {
        if !args.is_empty() {
            return Err(CacheError::WrongArity("discard".into()));
        }
        self.transaction
            .take()
            .ok_or(CacheError::WithoutMulti("DISCARD"))?;
        Ok(Reply::ok())
    }

    /// Whether a MULTI block is open
    pub fn in_transaction(&self) -> bool {
        self.transaction.is_some()
    }

    /// Whether unsupported commands are accepted as no-ops
    pub fn bypass_unsupported(&self) -> bool {
        self.bypass_unsupported
    }

    /// Get the command registry
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Get reference to the context (for testing/inspection)
    pub fn context(&self) -> &CommandContext {
        &self.context
    }

    /// Get mutable reference to the context (for testing/inspection)
    pub fn context_mut(&mut self) -> &mut CommandContext {
        &mut self.context
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}
