//! LLM Gateway port
//!
//! Defines the interface for sending one completion request to a hosted
//! model. The call is stateless: every request carries the full payload.

use async_trait::async_trait;
use musing_domain::{Model, PayloadBlock, SamplingSettings, Usage};
use thiserror::Error;

/// Errors reported by a gateway for a single request
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Throttled: {0}")]
    Throttled(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Timeout")]
    Timeout,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Whether repeating the same request could plausibly succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Retryable,
    Permanent,
}

impl GatewayError {
    /// Classify this error. Anything not known to be transient is permanent.
    pub fn class(&self) -> ErrorClass {
        match self {
            GatewayError::Throttled(_)
            | GatewayError::Connection(_)
            | GatewayError::Timeout
            | GatewayError::ServiceUnavailable(_) => ErrorClass::Retryable,
            _ => ErrorClass::Permanent,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, GatewayError::Configuration(_))
    }
}

/// One completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: Model,
    pub sampling: SamplingSettings,
    pub blocks: Vec<PayloadBlock>,
}

/// Provider reply: one or more text segments plus optional token counters.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionResponse {
    pub segments: Vec<String>,
    pub usage: Option<Usage>,
}

impl CompletionResponse {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            segments: vec![text.into()],
            usage: None,
        }
    }

    /// All text segments joined with newlines.
    pub fn text(&self) -> String {
        self.segments.join("\n")
    }
}

/// Gateway for LLM communication
///
/// This port defines how the application layer reaches a model provider.
/// Implementations (adapters) live in the infrastructure layer and map
/// provider failures onto [`GatewayError`] so the caller can decide what to
/// retry.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    /// Short provider name for logs (e.g. "bedrock")
    fn provider(&self) -> &str;

    /// Send one request and wait for the full reply
    async fn complete(&self, request: &CompletionRequest)
    -> Result<CompletionResponse, GatewayError>;
}
