//! Conversation domain entities

use crate::core::error::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// System prompt given to newly created conversations.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Claude. Provide chain-of-thought if forced.";

/// Author of a turn.
///
/// `Tool` covers non-text turn kinds (tool output, attachments rendered as
/// text). The payload builder decides whether such turns are skipped or
/// stringified; they are never silently treated as user text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    #[serde(rename = "tool_response")]
    Tool,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool_response",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message within a conversation (Entity)
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Reasoning extracted from the completion. `Some("")` means an empty
    /// delimiter pair was present; `None` means no pair was found.
    pub reasoning: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            reasoning: None,
            created_at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>, reasoning: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            reasoning,
            created_at: Utc::now(),
        }
    }

    pub fn tool(text: impl Into<String>) -> Self {
        Self {
            role: Role::Tool,
            text: text.into(),
            reasoning: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// Sampling parameters sent with every completion request (Value Object)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplingSettings {
    /// In `[0, 1]`
    pub temperature: f64,
    /// Strictly positive
    pub max_output_tokens: u32,
}

impl SamplingSettings {
    /// Create validated sampling settings.
    pub fn new(temperature: f64, max_output_tokens: u32) -> Result<Self, DomainError> {
        let settings = Self {
            temperature,
            max_output_tokens,
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(DomainError::InvalidSampling(format!(
                "temperature must be within [0, 1], got {}",
                self.temperature
            )));
        }
        if self.max_output_tokens == 0 {
            return Err(DomainError::InvalidSampling(
                "max_output_tokens must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 1000,
        }
    }
}

/// Settings applied to conversations created at runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationDefaults {
    pub system_prompt: String,
    pub force_reasoning: bool,
    pub sampling: SamplingSettings,
}

impl Default for ConversationDefaults {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            force_reasoning: false,
            sampling: SamplingSettings::default(),
        }
    }
}

/// Check that a name can be used as a conversation key.
///
/// The name becomes part of a storage key, so path separators, relative path
/// components and control characters are rejected.
pub fn validate_conversation_name(name: &str) -> Result<(), DomainError> {
    let invalid = name.trim().is_empty()
        || name != name.trim()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if invalid {
        Err(DomainError::InvalidConversationName(name.to_string()))
    } else {
        Ok(())
    }
}

/// A named, ordered list of turns plus the settings used to answer it (Entity)
///
/// Turn order is insertion order. Role alternation is not enforced: two user
/// turns in a row are kept and sent as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    name: String,
    turns: Vec<Turn>,
    system_prompt: String,
    force_reasoning: bool,
    sampling: SamplingSettings,
    created_at: DateTime<Utc>,
}

impl Conversation {
    /// Create an empty conversation with default settings.
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        Self::with_defaults(name, &ConversationDefaults::default())
    }

    pub fn with_defaults(
        name: impl Into<String>,
        defaults: &ConversationDefaults,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        validate_conversation_name(&name)?;
        defaults.sampling.validate()?;
        Ok(Self {
            name,
            turns: Vec::new(),
            system_prompt: defaults.system_prompt.trim().to_string(),
            force_reasoning: defaults.force_reasoning,
            sampling: defaults.sampling,
            created_at: Utc::now(),
        })
    }

    /// Rebuild a conversation from previously stored parts.
    pub fn from_parts(
        name: impl Into<String>,
        turns: Vec<Turn>,
        system_prompt: impl Into<String>,
        force_reasoning: bool,
        sampling: SamplingSettings,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        validate_conversation_name(&name)?;
        sampling.validate()?;
        Ok(Self {
            name,
            turns,
            system_prompt: system_prompt.into(),
            force_reasoning,
            sampling,
            created_at,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn force_reasoning(&self) -> bool {
        self.force_reasoning
    }

    pub fn sampling(&self) -> SamplingSettings {
        self.sampling
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn turn(&self, index: usize) -> Result<&Turn, DomainError> {
        let len = self.turns.len();
        self.turns
            .get(index)
            .ok_or(DomainError::IndexOutOfRange { index, len })
    }

    /// Append a turn at the end. Never reorders or deduplicates.
    pub fn append_turn(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    /// Replace the text of an existing turn in place.
    ///
    /// Later turns are left untouched; regenerating them is a separate step.
    pub fn edit_turn(&mut self, index: usize, new_text: impl Into<String>) -> Result<(), DomainError> {
        let len = self.turns.len();
        let turn = self
            .turns
            .get_mut(index)
            .ok_or(DomainError::IndexOutOfRange { index, len })?;
        turn.text = new_text.into();
        Ok(())
    }

    /// Remove the turn at `index`, shifting later turns down by one.
    pub fn delete_turn(&mut self, index: usize) -> Result<Turn, DomainError> {
        let len = self.turns.len();
        if index >= len {
            return Err(DomainError::IndexOutOfRange { index, len });
        }
        Ok(self.turns.remove(index))
    }

    /// Drop every turn after the first `len` turns.
    pub fn truncate_turns(&mut self, len: usize) {
        self.turns.truncate(len);
    }

    /// Remove all turns, keeping prompt and settings.
    pub fn clear_turns(&mut self) {
        self.turns.clear();
    }

    /// Set the system prompt. Stored trimmed.
    pub fn set_system_prompt(&mut self, prompt: impl AsRef<str>) {
        self.system_prompt = prompt.as_ref().trim().to_string();
    }

    pub fn set_force_reasoning(&mut self, force: bool) {
        self.force_reasoning = force;
    }

    pub fn set_sampling(&mut self, sampling: SamplingSettings) -> Result<(), DomainError> {
        sampling.validate()?;
        self.sampling = sampling;
        Ok(())
    }
}
