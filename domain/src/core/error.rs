//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Turn index {index} is out of range (conversation has {len} turns)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Turn {0} is not a user turn")]
    NotAUserTurn(usize),

    #[error("Invalid conversation name: {0:?}")]
    InvalidConversationName(String),

    #[error("Conversation already exists: {0}")]
    DuplicateConversation(String),

    #[error("Unknown conversation: {0}")]
    UnknownConversation(String),

    #[error("Invalid sampling settings: {0}")]
    InvalidSampling(String),

    #[error("Prompt is empty")]
    EmptyPrompt,
}

impl DomainError {
    /// Check if this error was caused by addressing a turn that does not exist
    pub fn is_index_out_of_range(&self) -> bool {
        matches!(self, DomainError::IndexOutOfRange { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_out_of_range_display() {
        let error = DomainError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(
            error.to_string(),
            "Turn index 4 is out of range (conversation has 2 turns)"
        );
    }

    #[test]
    fn test_is_index_out_of_range_check() {
        assert!(DomainError::IndexOutOfRange { index: 0, len: 0 }.is_index_out_of_range());
        assert!(!DomainError::EmptyPrompt.is_index_out_of_range());
        assert!(!DomainError::UnknownConversation("x".to_string()).is_index_out_of_range());
    }
}
