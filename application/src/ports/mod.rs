//! Port definitions (interfaces for external adapters)

pub mod conversation_logger;
pub mod conversation_store;
pub mod llm_gateway;
pub mod progress;
