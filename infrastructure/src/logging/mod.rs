//! Structured transcript logging.
//!
//! Provides [`JsonlConversationLogger`], a JSONL file writer implementing
//! the [`ConversationLogger`](musing_application::ConversationLogger) port.

mod jsonl_logger;

pub use jsonl_logger::JsonlConversationLogger;
