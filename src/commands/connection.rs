//! Connection commands (AUTH, ECHO, PING)

use super::{extract_bytes, Command, CommandContext};
use crate::error::Result;
use crate::protocol::{Arg, Reply};

/// AUTH command - Accepted and ignored
///
/// Syntax: AUTH password
pub struct AuthCommand;

impl Command for AuthCommand {
    fn execute(&self, _ctx: &mut CommandContext, _args: &[Arg]) -> Result<Reply> {
        Ok(Reply::ok())
    }

    fn name(&self) -> &'static str {
        "AUTH"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(2)
    }
}

/// ECHO command - Return the message
///
/// Syntax: ECHO message
pub struct EchoCommand;

impl Command for EchoCommand {
    fn execute(&self, _ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        Ok(Reply::bulk(extract_bytes(&args[0])?))
    }

    fn name(&self) -> &'static str {
        "ECHO"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}

/// PING command
///
/// Syntax: PING [message]
pub struct PingCommand;

impl Command for PingCommand {
    fn execute(&self, _ctx: &mut CommandContext, args: &[Arg]) -> Result<Reply> {
        match args.first() {
            Some(message) => Ok(Reply::bulk(extract_bytes(message)?)),
            None => Ok(Reply::status("PONG")),
        }
    }

    fn name(&self) -> &'static str {
        "PING"
    }

    fn max_args(&self) -> Option<usize> {
        Some(1)
    }
}
