//! Transcript export: CSV and Markdown
//!
//! Both formats carry one entry per turn with its role, text, reasoning
//! and creation time.

use chrono::SecondsFormat;
use musing_domain::{Conversation, Role, Turn};
use std::fmt::Write as _;
use std::io;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Markdown,
}

impl ExportFormat {
    pub fn render(&self, conversation: &Conversation) -> io::Result<String> {
        match self {
            ExportFormat::Csv => to_csv(conversation),
            ExportFormat::Markdown => Ok(to_markdown(conversation)),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(format!("Unknown export format {other:?} (csv, md)")),
        }
    }
}

fn timestamp(turn: &Turn) -> String {
    turn.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// `role,content,reasoning,timestamp` with CRLF line endings.
pub fn to_csv(conversation: &Conversation) -> io::Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["role", "content", "reasoning", "timestamp"])?;
    for turn in conversation.turns() {
        writer.write_record([
            turn.role.as_str(),
            turn.text.as_str(),
            turn.reasoning.as_deref().unwrap_or(""),
            timestamp(turn).as_str(),
        ])?;
    }
    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

fn role_title(role: Role) -> &'static str {
    match role {
        Role::User => "User",
        Role::Assistant => "Assistant",
        Role::Tool => "Tool",
    }
}

pub fn to_markdown(conversation: &Conversation) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# {}\n", conversation.name());
    let _ = writeln!(out, "_System prompt:_ {}\n", conversation.system_prompt());

    for turn in conversation.turns() {
        let _ = writeln!(out, "### {} · {}\n", role_title(turn.role), timestamp(turn));
        if let Some(reasoning) = &turn.reasoning {
            out.push_str("> **Reasoning**\n");
            for line in reasoning.lines() {
                let _ = writeln!(out, "> {line}");
            }
            out.push('\n');
        }
        let _ = writeln!(out, "{}\n", turn.text);
    }
    out
}
