//! Slash commands understood by the chat REPL
//!
//! Turn numbers are 1-based on the command line and converted to turn
//! indices here.

use crate::output::export::ExportFormat;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ChatCommand {
    New(String),
    Switch(String),
    List,
    DeleteChat(String),
    History,
    System(String),
    Thinking(bool),
    ShowThinking(bool),
    Temperature(f64),
    MaxTokens(u32),
    Edit { index: usize, text: String },
    Delete(usize),
    Retry(usize),
    Clear,
    Save,
    Load(Option<String>),
    Saved,
    Export { format: ExportFormat, path: PathBuf },
    Ack,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("{0}")]
    Invalid(String),
}

/// Command names with their usage line, in help order.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/new", "/new NAME          - Create a conversation and switch to it"),
    ("/switch", "/switch NAME       - Switch to another conversation"),
    ("/list", "/list              - List open conversations"),
    ("/delete-chat", "/delete-chat NAME  - Close a conversation"),
    ("/history", "/history           - Show the current conversation"),
    ("/system", "/system TEXT       - Set the system prompt"),
    ("/thinking", "/thinking on|off   - Ask the model for a <thinking> block"),
    ("/show-thinking", "/show-thinking on|off - Print reasoning under answers"),
    ("/temp", "/temp X            - Set temperature (0 to 1)"),
    ("/max-tokens", "/max-tokens N      - Set the reply token limit"),
    ("/edit", "/edit N TEXT       - Replace the text of turn N"),
    ("/delete", "/delete N          - Delete turn N"),
    ("/retry", "/retry N           - Regenerate the reply to user turn N"),
    ("/clear", "/clear             - Remove all turns"),
    ("/save", "/save              - Save the conversation"),
    ("/load", "/load [NAME]       - Load a saved conversation"),
    ("/saved", "/saved             - List saved conversations"),
    ("/export", "/export csv|md PATH - Export the conversation"),
    ("/ack", "/ack               - Leave degraded mode, re-enable retries"),
    ("/help", "/help              - Show this help"),
    ("/quit", "/quit              - Exit"),
];

fn usage(command: &str) -> &'static str {
    COMMANDS
        .iter()
        .find(|(name, _)| *name == command)
        .map(|(_, usage)| *usage)
        .unwrap_or("/help")
}

fn required<'a>(command: &str, arg: &'a str) -> Result<&'a str, CommandError> {
    if arg.is_empty() {
        Err(CommandError::Usage(usage(command)))
    } else {
        Ok(arg)
    }
}

fn parse_switch(command: &str, arg: &str) -> Result<bool, CommandError> {
    match arg.to_lowercase().as_str() {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        _ => Err(CommandError::Usage(usage(command))),
    }
}

/// Parse a 1-based turn number into a turn index.
fn parse_turn(command: &str, arg: &str) -> Result<usize, CommandError> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::Invalid(format!(
            "Turn number must be 1 or greater, got {arg:?} ({})",
            usage(command)
        ))),
    }
}

impl ChatCommand {
    /// Parse a line starting with `/`.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let line = line.trim();
        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let parsed = match command {
            "/new" => ChatCommand::New(required(command, rest)?.to_string()),
            "/switch" => ChatCommand::Switch(required(command, rest)?.to_string()),
            "/list" | "/chats" => ChatCommand::List,
            "/delete-chat" => ChatCommand::DeleteChat(required(command, rest)?.to_string()),
            "/history" => ChatCommand::History,
            "/system" => ChatCommand::System(required(command, rest)?.to_string()),
            "/thinking" => ChatCommand::Thinking(parse_switch(command, rest)?),
            "/show-thinking" => ChatCommand::ShowThinking(parse_switch(command, rest)?),
            "/temp" => {
                let value = required(command, rest)?;
                let temperature = value.parse::<f64>().map_err(|_| {
                    CommandError::Invalid(format!("Not a number: {value:?}"))
                })?;
                ChatCommand::Temperature(temperature)
            }
            "/max-tokens" => {
                let value = required(command, rest)?;
                let tokens = value.parse::<u32>().map_err(|_| {
                    CommandError::Invalid(format!("Not a token count: {value:?}"))
                })?;
                ChatCommand::MaxTokens(tokens)
            }
            "/edit" => {
                let (number, text) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::Usage(usage(command)))?;
                ChatCommand::Edit {
                    index: parse_turn(command, number)?,
                    text: required(command, text.trim())?.to_string(),
                }
            }
            "/delete" => ChatCommand::Delete(parse_turn(command, required(command, rest)?)?),
            "/retry" => ChatCommand::Retry(parse_turn(command, required(command, rest)?)?),
            "/clear" => ChatCommand::Clear,
            "/save" => ChatCommand::Save,
            "/load" => ChatCommand::Load((!rest.is_empty()).then(|| rest.to_string())),
            "/saved" => ChatCommand::Saved,
            "/export" => {
                let (format, path) = rest
                    .split_once(char::is_whitespace)
                    .ok_or(CommandError::Usage(usage(command)))?;
                let format = format
                    .parse::<ExportFormat>()
                    .map_err(CommandError::Invalid)?;
                ChatCommand::Export {
                    format,
                    path: PathBuf::from(required(command, path.trim())?),
                }
            }
            "/ack" => ChatCommand::Ack,
            "/help" | "/h" | "/?" => ChatCommand::Help,
            "/quit" | "/exit" | "/q" => ChatCommand::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(ChatCommand::parse("/list").unwrap(), ChatCommand::List);
        assert_eq!(ChatCommand::parse("/q").unwrap(), ChatCommand::Quit);
        assert_eq!(
            ChatCommand::parse("/new  Trip Plans ").unwrap(),
            ChatCommand::New("Trip Plans".to_string())
        );
        assert_eq!(ChatCommand::parse("/load").unwrap(), ChatCommand::Load(None));
        assert_eq!(
            ChatCommand::parse("/load math").unwrap(),
            ChatCommand::Load(Some("math".to_string()))
        );
    }

    #[test]
    fn test_turn_numbers_are_one_based() {
        assert_eq!(ChatCommand::parse("/delete 1").unwrap(), ChatCommand::Delete(0));
        assert_eq!(ChatCommand::parse("/retry 3").unwrap(), ChatCommand::Retry(2));
        assert_eq!(
            ChatCommand::parse("/edit 2 what about 3+3?").unwrap(),
            ChatCommand::Edit {
                index: 1,
                text: "what about 3+3?".to_string()
            }
        );
        assert!(matches!(
            ChatCommand::parse("/delete 0"),
            Err(CommandError::Invalid(_))
        ));
    }

    #[test]
    fn test_switches_and_numbers() {
        assert_eq!(
            ChatCommand::parse("/thinking ON").unwrap(),
            ChatCommand::Thinking(true)
        );
        assert_eq!(
            ChatCommand::parse("/show-thinking off").unwrap(),
            ChatCommand::ShowThinking(false)
        );
        assert_eq!(
            ChatCommand::parse("/temp 0.3").unwrap(),
            ChatCommand::Temperature(0.3)
        );
        assert_eq!(
            ChatCommand::parse("/max-tokens 512").unwrap(),
            ChatCommand::MaxTokens(512)
        );
        assert!(ChatCommand::parse("/thinking maybe").is_err());
        assert!(ChatCommand::parse("/max-tokens -1").is_err());
    }

    #[test]
    fn test_export_command() {
        assert_eq!(
            ChatCommand::parse("/export md notes/chat.md").unwrap(),
            ChatCommand::Export {
                format: ExportFormat::Markdown,
                path: PathBuf::from("notes/chat.md")
            }
        );
        assert!(matches!(
            ChatCommand::parse("/export pdf out.pdf"),
            Err(CommandError::Invalid(_))
        ));
    }

    #[test]
    fn test_missing_arguments_show_usage() {
        let err = ChatCommand::parse("/new").unwrap_err();
        assert!(err.to_string().contains("/new NAME"));
        assert!(matches!(
            ChatCommand::parse("/export csv"),
            Err(CommandError::Usage(_))
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert_eq!(
            ChatCommand::parse("/models").unwrap_err(),
            CommandError::Unknown("/models".to_string())
        );
    }
}
