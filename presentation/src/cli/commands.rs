//! CLI command definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Completion transport selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderArg {
    /// AWS Bedrock Converse API
    Bedrock,
    /// Anthropic Messages API
    Anthropic,
}

impl ProviderArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderArg::Bedrock => "bedrock",
            ProviderArg::Anthropic => "anthropic",
        }
    }
}

/// CLI arguments for musing
#[derive(Parser, Debug)]
#[command(name = "musing")]
#[command(author, version, about = "Chat with Claude and keep its reasoning apart from the answer")]
#[command(long_about = r#"
Musing sends a conversation to a hosted Claude model and splits each reply
into the visible answer and the <thinking> block, if the model produced one.

Without a prompt it starts an interactive chat; with one it answers once.

Configuration files are loaded from (in priority order):
1. MUSING_* environment variables (nested keys split on '__')
2. --config <path>     Explicit config file
3. ./musing.toml       Project-level config
4. ~/.config/musing/config.toml   Global config

Example:
  musing "What is 2+2?"
  musing --thinking -c math --resume --save "And 3+3?"
  musing --provider anthropic -m claude-sonnet-4.5
"#)]
pub struct Cli {
    /// Prompt to send once (starts the chat REPL when omitted)
    pub prompt: Option<String>,

    /// Conversation name
    #[arg(short, long, value_name = "NAME", default_value = "Default")]
    pub conversation: String,

    /// Load the conversation from storage before sending
    #[arg(long)]
    pub resume: bool,

    /// Save the conversation to storage after the reply
    #[arg(long)]
    pub save: bool,

    /// Model alias or raw provider model id (overrides config)
    #[arg(short, long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Completion transport (overrides config)
    #[arg(long, value_enum)]
    pub provider: Option<ProviderArg>,

    /// Ask the model for a <thinking> block
    #[arg(long)]
    pub thinking: bool,

    /// Do not print reasoning
    #[arg(long)]
    pub hide_thinking: bool,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and the effective config, then exit
    #[arg(long)]
    pub show_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_start_chat() {
        let cli = Cli::try_parse_from(["musing"]).unwrap();
        assert!(cli.prompt.is_none());
        assert_eq!(cli.conversation, "Default");
        assert_eq!(cli.verbose, 0);
        assert!(!cli.resume && !cli.save);
    }

    #[test]
    fn test_single_shot_flags() {
        let cli = Cli::try_parse_from([
            "musing",
            "-vv",
            "--provider",
            "anthropic",
            "-c",
            "math",
            "--resume",
            "--save",
            "--thinking",
            "2+2?",
        ])
        .unwrap();

        assert_eq!(cli.prompt.as_deref(), Some("2+2?"));
        assert_eq!(cli.conversation, "math");
        assert_eq!(cli.provider, Some(ProviderArg::Anthropic));
        assert_eq!(cli.verbose, 2);
        assert!(cli.resume && cli.save && cli.thinking);
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(Cli::try_parse_from(["musing", "--provider", "openai"]).is_err());
    }
}
