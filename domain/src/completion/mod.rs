//! Completion results.
//!
//! - [`splitter::split_reasoning`]: separates a `<thinking>` block from the answer
//! - [`CompletionResult`]: visible answer plus reasoning for one invocation
//! - [`ReasoningDisplay`]: whether an empty reasoning block counts for display

pub mod splitter;

use serde::{Deserialize, Serialize};

/// Outcome of splitting one raw completion.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompletionResult {
    pub visible_text: String,
    /// Empty when no block was found, or when the block itself was empty.
    pub reasoning_text: String,
    /// Whether a complete delimiter pair was found.
    pub reasoning_found: bool,
}

impl CompletionResult {
    /// Reasoning as stored on a turn: `Some` whenever a pair was found,
    /// even if it was empty.
    pub fn reasoning(&self) -> Option<&str> {
        self.reasoning_found.then_some(self.reasoning_text.as_str())
    }
}

/// Token counters reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// When stored reasoning is shown alongside an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasoningDisplay {
    /// Show whenever a delimiter pair was found, even if empty.
    #[default]
    WhenPresent,
    /// Show only non-empty reasoning.
    WhenNonEmpty,
}

impl ReasoningDisplay {
    /// Reasoning to render for a turn, if any.
    pub fn visible<'a>(&self, reasoning: Option<&'a str>) -> Option<&'a str> {
        match (self, reasoning) {
            (ReasoningDisplay::WhenPresent, Some(text)) => Some(text),
            (ReasoningDisplay::WhenNonEmpty, Some(text)) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }
}
