//! Per-session chat state.
//!
//! Everything a chat front end keeps between user actions lives here and
//! is built once at startup, then passed explicitly to whoever needs it.

use musing_domain::{
    Conversation, ConversationDefaults, ConversationRegistry, DomainError, ReasoningDisplay,
};

#[derive(Debug, Clone)]
pub struct ChatState {
    pub registry: ConversationRegistry,
    /// Whether reasoning is printed under each answer.
    pub show_reasoning: bool,
    pub reasoning_display: ReasoningDisplay,
}

impl ChatState {
    /// Start a session with a single `Default` conversation.
    pub fn new(
        defaults: ConversationDefaults,
        show_reasoning: bool,
        reasoning_display: ReasoningDisplay,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            registry: ConversationRegistry::new(defaults)?,
            show_reasoning,
            reasoning_display,
        })
    }

    pub fn current(&self) -> Result<&Conversation, DomainError> {
        self.registry.current()
    }

    pub fn current_mut(&mut self) -> Result<&mut Conversation, DomainError> {
        self.registry.current_mut()
    }

    /// Reasoning to print for `reasoning`, honoring the display toggle.
    pub fn visible_reasoning<'a>(&self, reasoning: Option<&'a str>) -> Option<&'a str> {
        if !self.show_reasoning {
            return None;
        }
        self.reasoning_display.visible(reasoning)
    }

    /// Open `name`, creating it with the session defaults if it does not
    /// exist yet.
    pub fn open(&mut self, name: &str) -> Result<&mut Conversation, DomainError> {
        if self.registry.contains(name) {
            self.registry.select(name)?;
            self.registry.current_mut()
        } else {
            self.registry.create(name)
        }
    }
}
