//! In-process call protocol
//!
//! Defines the values exchanged between callers and commands. Independent of
//! the store and of command handling.

mod types;

pub use types::{format_float, parse_float, Arg, Reply};
