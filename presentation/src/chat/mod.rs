//! Interactive chat module
//!
//! Provides a readline-based interactive chat interface with slash commands.

mod command;
mod helper;
mod repl;

pub use command::{COMMANDS, ChatCommand, CommandError};
pub use repl::{ChatRepl, ReplError, ReplOutput};
