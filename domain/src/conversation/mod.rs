//! Conversation domain.
//!
//! - [`entities::Conversation`]: a named, ordered list of turns plus settings
//! - [`entities::Turn`]: a single message with optional extracted reasoning
//! - [`registry::ConversationRegistry`]: named conversations and the current selection
//! - [`record::ConversationRecord`]: the persisted JSON projection

pub mod entities;
pub mod record;
pub mod registry;
