//! Completion transports
//!
//! Each provider implements the [`LlmGateway`](musing_application::LlmGateway)
//! port and is compiled in behind its own cargo feature.

#[cfg(feature = "anthropic")]
pub mod anthropic;

#[cfg(feature = "bedrock")]
pub mod bedrock;
