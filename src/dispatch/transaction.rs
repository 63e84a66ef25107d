//! MULTI / EXEC / DISCARD state

use crate::commands::Command;
use crate::protocol::Arg;
use std::sync::Arc;

/// A command validated at queue time, run at EXEC
pub(crate) struct Queued {
    pub command: Arc<dyn Command>,
    pub args: Vec<Arg>,
}

/// An open transaction
///
/// A command rejected while queueing (unknown, unsupported or wrong arity)
/// poisons the transaction; EXEC then discards the whole queue.
#[derive(Default)]
pub(crate) struct Transaction {
    queue: Vec<Queued>,
    aborted: bool,
}

impl Transaction {
    pub fn push(&mut self, command: Arc<dyn Command>, args: &[Arg]) {
        self.queue.push(Queued {
            command,
            args: args.to_vec(),
        });
    }

    pub fn abort(&mut self) {
        self.aborted = true;
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn into_queue(self) -> Vec<Queued> {
        self.queue
    }
}
