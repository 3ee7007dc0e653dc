//! Presentation layer for musing
//!
//! This crate contains the CLI definition, the interactive chat REPL,
//! console and export formatters, and the waiting indicator.

pub mod chat;
pub mod cli;
pub mod config;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use chat::{ChatCommand, ChatRepl, ReplError, ReplOutput};
pub use cli::commands::{Cli, ProviderArg};
pub use config::ReplConfig;
pub use output::console::ConsoleFormatter;
pub use output::export::ExportFormat;
pub use progress::reporter::{ProgressReporter, SimpleProgress};
