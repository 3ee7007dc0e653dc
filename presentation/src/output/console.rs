//! Console output formatting for chat replies and transcripts

use colored::Colorize;
use musing_application::ChatState;
use musing_domain::{Conversation, Role, Turn, Usage};

/// Formats chat output for terminal display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// An assistant reply, with its reasoning above the answer when shown.
    pub fn reply(answer: &str, reasoning: Option<&str>) -> String {
        let mut output = String::new();
        if let Some(reasoning) = reasoning {
            output.push_str(&format!("{}\n", "Thinking:".magenta().bold()));
            let body = if reasoning.trim().is_empty() {
                "(empty)".to_string()
            } else {
                reasoning.trim().to_string()
            };
            output.push_str(&format!("{}\n\n", Self::indent(&body, "  ").dimmed()));
        }
        output.push_str(answer);
        output
    }

    /// Token counters and attempt count after a reply.
    pub fn usage_line(usage: Option<Usage>, attempts: u32) -> String {
        let mut parts = Vec::new();
        if let Some(usage) = usage {
            parts.push(format!(
                "{} in / {} out tokens",
                usage.input_tokens, usage.output_tokens
            ));
        }
        if attempts > 1 {
            parts.push(format!("{attempts} attempts"));
        }
        parts.join(", ").dimmed().to_string()
    }

    fn role_label(role: Role) -> colored::ColoredString {
        match role {
            Role::User => "you".cyan().bold(),
            Role::Assistant => "claude".green().bold(),
            Role::Tool => "tool".yellow().bold(),
        }
    }

    fn turn(number: usize, turn: &Turn, reasoning: Option<&str>) -> String {
        let header = format!(
            "{} {}",
            format!("#{number}").dimmed(),
            Self::role_label(turn.role)
        );
        match turn.role {
            Role::Assistant => format!("{header}\n{}", Self::reply(&turn.text, reasoning)),
            _ => format!("{header}\n{}", turn.text),
        }
    }

    /// All turns of a conversation, numbered from 1.
    pub fn history(conversation: &Conversation, state: &ChatState) -> String {
        if conversation.is_empty() {
            return format!("{}", "(no turns yet)".dimmed());
        }
        conversation
            .turns()
            .iter()
            .enumerate()
            .map(|(i, turn)| {
                Self::turn(i + 1, turn, state.visible_reasoning(turn.reasoning.as_deref()))
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Open conversations, marking the current one.
    pub fn conversation_list(state: &ChatState) -> String {
        let current = state.registry.current_name();
        state
            .registry
            .names()
            .into_iter()
            .map(|name| {
                let turns = state.registry.get(&name).map(Conversation::len).unwrap_or(0);
                let marker = if name == current { "*" } else { " " };
                format!("{marker} {name} {}", format!("({turns} turns)").dimmed())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// One-line summary of the current conversation's settings.
    pub fn settings(conversation: &Conversation, model: &str) -> String {
        let sampling = conversation.sampling();
        format!(
            "{} {}  {} {}  {} {}  {} {}",
            "Conversation:".cyan().bold(),
            conversation.name(),
            "Model:".cyan().bold(),
            model,
            "Temperature:".cyan().bold(),
            sampling.temperature,
            "Thinking:".cyan().bold(),
            if conversation.force_reasoning() {
                "on"
            } else {
                "off"
            },
        )
    }

    pub fn success(message: &str) -> String {
        format!("{} {}", "v".green(), message)
    }

    pub fn warning(message: &str) -> String {
        format!("{} {}", "!".yellow().bold(), message.yellow())
    }

    pub fn error(message: &str) -> String {
        format!("{} {}", "Error:".red().bold(), message)
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use musing_domain::{ConversationDefaults, ReasoningDisplay};

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_reply_with_and_without_reasoning() {
        plain();
        assert_eq!(ConsoleFormatter::reply("4", None), "4");

        let output = ConsoleFormatter::reply("4", Some("add\nthe numbers"));
        assert_eq!(output, "Thinking:\n  add\n  the numbers\n\n4");

        let output = ConsoleFormatter::reply("4", Some(""));
        assert!(output.contains("(empty)"));
    }

    #[test]
    fn test_usage_line() {
        plain();
        let usage = Some(Usage {
            input_tokens: 10,
            output_tokens: 2,
        });
        assert_eq!(
            ConsoleFormatter::usage_line(usage, 2),
            "10 in / 2 out tokens, 2 attempts"
        );
        assert_eq!(ConsoleFormatter::usage_line(None, 1), "");
    }

    #[test]
    fn test_history_respects_reasoning_toggle() {
        plain();
        let mut state =
            ChatState::new(ConversationDefaults::default(), true, ReasoningDisplay::WhenPresent)
                .unwrap();
        let conversation = state.current_mut().unwrap();
        conversation.append_turn(Turn::user("2+2?"));
        conversation.append_turn(Turn::assistant("4", Some("add".to_string())));

        let conversation = state.current().unwrap().clone();
        let shown = ConsoleFormatter::history(&conversation, &state);
        assert!(shown.contains("#1 you\n2+2?"));
        assert!(shown.contains("#2 claude\nThinking:"));

        state.show_reasoning = false;
        let hidden = ConsoleFormatter::history(&conversation, &state);
        assert!(!hidden.contains("Thinking:"));
    }

    #[test]
    fn test_conversation_list_marks_current() {
        plain();
        let mut state =
            ChatState::new(ConversationDefaults::default(), true, ReasoningDisplay::default())
                .unwrap();
        state.open("math").unwrap();

        let list = ConsoleFormatter::conversation_list(&state);
        assert!(list.contains("  Default (0 turns)"));
        assert!(list.contains("* math (0 turns)"));
    }
}
