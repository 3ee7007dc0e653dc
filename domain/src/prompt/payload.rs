//! Payload building: conversation → ordered role-tagged message blocks.
//!
//! The remote API does not reliably accept a separate system role, so both
//! the reasoning instruction and the system prompt travel as user blocks
//! ahead of the conversation turns:
//!
//! ```text
//! [reasoning instruction]   (only when force_reasoning is set)
//! [(System Prompt) ...]     (only when the prompt is non-empty)
//! turn 0, turn 1, ...       (stored order, roles mapped directly)
//! ```

use crate::conversation::entities::{Conversation, Role, Turn};
use serde::{Deserialize, Serialize};

/// Instruction prepended when a conversation forces visible reasoning.
pub const REASONING_INSTRUCTION: &str =
    "Please include chain-of-thought in <thinking>...</thinking> tags.";

/// Label placed above the system prompt block.
pub const SYSTEM_PROMPT_LABEL: &str = "(System Prompt)";

/// Label placed above stringified tool output.
pub const TOOL_OUTPUT_LABEL: &str = "(Tool output)";

/// Role of a block on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadRole {
    User,
    Assistant,
}

impl PayloadRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadRole::User => "user",
            PayloadRole::Assistant => "assistant",
        }
    }
}

/// One role-tagged text block sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadBlock {
    pub role: PayloadRole,
    pub text: String,
}

impl PayloadBlock {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: PayloadRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: PayloadRole::Assistant,
            text: text.into(),
        }
    }
}

/// How turns with [`Role::Tool`] are carried into the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonTextTurnPolicy {
    /// Leave them out.
    #[default]
    Skip,
    /// Send them as labelled user blocks.
    Stringify,
}

/// How many conversation turns are sent with each request.
///
/// Applies to turns only; the instruction blocks are always sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextWindow {
    /// Send the full history.
    #[default]
    Full,
    /// Send only the most recent `n` turn blocks.
    Recent(usize),
}

impl ContextWindow {
    /// `0` means the full history.
    pub fn from_turn_limit(limit: usize) -> Self {
        if limit == 0 {
            ContextWindow::Full
        } else {
            ContextWindow::Recent(limit)
        }
    }
}

/// The blocks for one completion request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Payload {
    /// Reasoning instruction and system prompt blocks.
    pub preamble: Vec<PayloadBlock>,
    /// Conversation turns in stored order.
    pub turns: Vec<PayloadBlock>,
}

impl Payload {
    /// Keep only the turns allowed by `window`.
    pub fn windowed(mut self, window: ContextWindow) -> Self {
        if let ContextWindow::Recent(n) = window
            && self.turns.len() > n
        {
            let excess = self.turns.len() - n;
            self.turns.drain(..excess);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.preamble.len() + self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_blocks(self) -> Vec<PayloadBlock> {
        let mut blocks = self.preamble;
        blocks.extend(self.turns);
        blocks
    }
}

/// Build the request payload for a conversation. Pure; performs no
/// validation of role alternation or context length.
pub fn build_payload(conversation: &Conversation, non_text: NonTextTurnPolicy) -> Payload {
    let mut preamble = Vec::new();

    if conversation.force_reasoning() {
        preamble.push(PayloadBlock::user(REASONING_INSTRUCTION));
    }

    let system_prompt = conversation.system_prompt().trim();
    if !system_prompt.is_empty() {
        preamble.push(PayloadBlock::user(format!(
            "{SYSTEM_PROMPT_LABEL}\n{system_prompt}"
        )));
    }

    let turns = conversation
        .turns()
        .iter()
        .filter_map(|turn| turn_block(turn, non_text))
        .collect();

    Payload { preamble, turns }
}

fn turn_block(turn: &Turn, non_text: NonTextTurnPolicy) -> Option<PayloadBlock> {
    match turn.role {
        Role::User => Some(PayloadBlock::user(turn.text.clone())),
        Role::Assistant => Some(PayloadBlock::assistant(turn.text.clone())),
        Role::Tool => match non_text {
            NonTextTurnPolicy::Skip => None,
            NonTextTurnPolicy::Stringify => Some(PayloadBlock::user(format!(
                "{TOOL_OUTPUT_LABEL}\n{}",
                turn.text
            ))),
        },
    }
}
