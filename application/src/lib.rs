//! Application layer for musing
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod state;
pub mod use_cases;

// Re-export commonly used types
pub use config::{ChatParams, RetryPolicy};
pub use ports::{
    conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger},
    conversation_store::{ConversationStore, StorageError},
    llm_gateway::{CompletionRequest, CompletionResponse, ErrorClass, GatewayError, LlmGateway},
    progress::{NoProgress, ProgressNotifier},
};
pub use state::ChatState;
pub use use_cases::invoke_completion::{
    CompletionInvoker, InvocationError, InvocationOutcome, build_request,
};
pub use use_cases::manage_conversations::{ArchiveError, ConversationArchive};
pub use use_cases::send_message::{
    ChatError, FailureTracker, InFlightGuard, InFlightRegistry, SendMessageOutput,
    SendMessageUseCase,
};
