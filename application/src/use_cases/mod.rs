//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod invoke_completion;
pub mod manage_conversations;
pub mod send_message;
