//! Infrastructure layer for musing
//!
//! Adapters that implement the ports defined in the application layer:
//! completion transports, conversation stores, the JSONL transcript
//! logger, and configuration file loading.

pub mod config;
pub mod logging;
pub mod providers;
pub mod storage;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, FileConfig, FileOutputConfig, FileReplConfig, ProviderKind,
    StorageBackend,
};
pub use logging::JsonlConversationLogger;
pub use storage::LocalConversationStore;

#[cfg(feature = "anthropic")]
pub use providers::anthropic::AnthropicGateway;
#[cfg(feature = "bedrock")]
pub use providers::bedrock::BedrockGateway;
#[cfg(feature = "s3")]
pub use storage::S3ConversationStore;
