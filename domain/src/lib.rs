//! Domain layer for musing
//!
//! This crate contains the core chat pipeline logic: conversations and their
//! turns, payload construction for the remote model, and extraction of the
//! reasoning block from a completion. It performs no I/O and has no
//! dependencies on infrastructure or presentation concerns.
//!
//! # Pipeline
//!
//! ```text
//! Conversation ──build_payload──▶ Payload ──(remote model)──▶ raw text
//!      ▲                                                        │
//!      └──────────── Turn::assistant ◀── split_reasoning ◀──────┘
//! ```

pub mod completion;
pub mod config;
pub mod conversation;
pub mod core;
pub mod prompt;
pub mod util;

// Re-export commonly used types
pub use completion::{
    CompletionResult, ReasoningDisplay, Usage,
    splitter::{ReasoningDelimiters, split_reasoning, split_reasoning_with},
};
pub use config::{ConfigIssue, ConfigIssueCode, Severity};
pub use conversation::{
    entities::{
        Conversation, ConversationDefaults, DEFAULT_SYSTEM_PROMPT, Role, SamplingSettings, Turn,
        validate_conversation_name,
    },
    record::{ConversationRecord, name_from_key, record_key},
    registry::{ConversationRegistry, DEFAULT_CONVERSATION},
};
pub use core::{error::DomainError, model::Model};
pub use prompt::payload::{
    ContextWindow, NonTextTurnPolicy, Payload, PayloadBlock, PayloadRole, build_payload,
};
