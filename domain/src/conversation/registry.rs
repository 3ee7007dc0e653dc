//! Registry of named conversations with a current selection.

use super::entities::{Conversation, ConversationDefaults};
use crate::core::error::DomainError;
use std::collections::HashMap;

/// Name of the conversation every registry starts with.
pub const DEFAULT_CONVERSATION: &str = "Default";

/// Name → conversation map plus the currently selected conversation.
///
/// The registry always holds at least one conversation, and the current
/// name always refers to an entry.
#[derive(Debug, Clone)]
pub struct ConversationRegistry {
    conversations: HashMap<String, Conversation>,
    current: String,
    defaults: ConversationDefaults,
}

impl ConversationRegistry {
    /// Create a registry holding a single empty `Default` conversation.
    pub fn new(defaults: ConversationDefaults) -> Result<Self, DomainError> {
        let initial = Conversation::with_defaults(DEFAULT_CONVERSATION, &defaults)?;
        let mut conversations = HashMap::new();
        conversations.insert(DEFAULT_CONVERSATION.to_string(), initial);
        Ok(Self {
            conversations,
            current: DEFAULT_CONVERSATION.to_string(),
            defaults,
        })
    }

    /// Create a new conversation and select it.
    pub fn create(&mut self, name: &str) -> Result<&mut Conversation, DomainError> {
        if self.conversations.contains_key(name) {
            return Err(DomainError::DuplicateConversation(name.to_string()));
        }
        let conversation = Conversation::with_defaults(name, &self.defaults)?;
        self.conversations.insert(name.to_string(), conversation);
        self.current = name.to_string();
        self.current_mut()
    }

    pub fn select(&mut self, name: &str) -> Result<(), DomainError> {
        if !self.conversations.contains_key(name) {
            return Err(DomainError::UnknownConversation(name.to_string()));
        }
        self.current = name.to_string();
        Ok(())
    }

    pub fn current_name(&self) -> &str {
        &self.current
    }

    pub fn current(&self) -> Result<&Conversation, DomainError> {
        self.get(&self.current)
    }

    pub fn current_mut(&mut self) -> Result<&mut Conversation, DomainError> {
        let name = self.current.clone();
        self.get_mut(&name)
    }

    pub fn get(&self, name: &str) -> Result<&Conversation, DomainError> {
        self.conversations
            .get(name)
            .ok_or_else(|| DomainError::UnknownConversation(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Conversation, DomainError> {
        self.conversations
            .get_mut(name)
            .ok_or_else(|| DomainError::UnknownConversation(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.conversations.contains_key(name)
    }

    /// Conversation names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.conversations.keys().cloned().collect();
        names.sort();
        names
    }

    /// Insert a conversation, replacing any entry with the same name.
    pub fn insert(&mut self, conversation: Conversation) {
        self.conversations
            .insert(conversation.name().to_string(), conversation);
    }

    /// Delete a conversation.
    ///
    /// If the current conversation is removed, the first remaining name (in
    /// sorted order) becomes current; an emptied registry gets a fresh
    /// `Default` conversation.
    pub fn remove(&mut self, name: &str) -> Result<Conversation, DomainError> {
        let removed = self
            .conversations
            .remove(name)
            .ok_or_else(|| DomainError::UnknownConversation(name.to_string()))?;

        if self.conversations.is_empty() {
            let fresh = Conversation::with_defaults(DEFAULT_CONVERSATION, &self.defaults)?;
            self.conversations
                .insert(DEFAULT_CONVERSATION.to_string(), fresh);
        }
        if self.current == name
            && let Some(first) = self.names().into_iter().next()
        {
            self.current = first;
        }
        Ok(removed)
    }
}
