//! Completion Invoker.
//!
//! Sends one payload to the model through an [`LlmGateway`], retrying
//! retryable failures under a [`RetryPolicy`]. The call blocks until the
//! model replies or the attempt budget is spent; there is no streaming and
//! no cancellation.

use std::sync::Arc;

use musing_domain::util::preview;
use musing_domain::{Conversation, Usage, build_payload};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ChatParams, RetryPolicy};
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{CompletionRequest, GatewayError, LlmGateway};
use crate::ports::progress::ProgressNotifier;

/// Errors surfaced by the invoker once it has stopped trying.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
    /// Missing or invalid credentials, region or model id. Never retried.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A permanent failure, or a retryable one after the budget ran out.
    #[error("Model invocation failed after {attempts} attempt(s): {source}")]
    Permanent {
        attempts: u32,
        #[source]
        source: GatewayError,
    },
}

impl InvocationError {
    /// Number of transport calls made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            InvocationError::Configuration(_) => 1,
            InvocationError::Permanent { attempts, .. } => *attempts,
        }
    }
}

/// Raw reply from a successful invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationOutcome {
    pub raw_text: String,
    pub usage: Option<Usage>,
    pub attempts: u32,
}

/// Build the request for the next reply in `conversation`.
pub fn build_request(conversation: &Conversation, params: &ChatParams) -> CompletionRequest {
    let payload = build_payload(conversation, params.non_text_turns).windowed(params.context_window);
    CompletionRequest {
        model: params.model.clone(),
        sampling: conversation.sampling(),
        blocks: payload.into_blocks(),
    }
}

/// Retrying wrapper around a single gateway.
pub struct CompletionInvoker {
    gateway: Arc<dyn LlmGateway>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl Clone for CompletionInvoker {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
            conversation_logger: self.conversation_logger.clone(),
        }
    }
}

impl CompletionInvoker {
    pub fn new(gateway: Arc<dyn LlmGateway>) -> Self {
        Self {
            gateway,
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn provider(&self) -> &str {
        self.gateway.provider()
    }

    /// Send `request`, retrying retryable errors until `policy` runs out.
    ///
    /// `conversation` labels log lines and events only.
    pub async fn invoke(
        &self,
        conversation: &str,
        request: &CompletionRequest,
        policy: &RetryPolicy,
        progress: &dyn ProgressNotifier,
    ) -> Result<InvocationOutcome, InvocationError> {
        progress.on_request_start(conversation);
        let result = self.invoke_with_retry(conversation, request, policy, progress).await;
        progress.on_request_end(result.is_ok());
        result
    }

    async fn invoke_with_retry(
        &self,
        conversation: &str,
        request: &CompletionRequest,
        policy: &RetryPolicy,
        progress: &dyn ProgressNotifier,
    ) -> Result<InvocationOutcome, InvocationError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!(
                "Completion attempt {}/{} for '{}' via {} ({} blocks, model {})",
                attempt,
                policy.max_attempts,
                conversation,
                self.gateway.provider(),
                request.blocks.len(),
                request.model
            );
            self.conversation_logger
                .log(ConversationEvent::completion_request(
                    conversation,
                    request.model.as_str(),
                    attempt,
                    request.blocks.len(),
                ));

            let error = match self.gateway.complete(request).await {
                Ok(response) => {
                    let raw_text = response.text();
                    info!(
                        "Completion for '{}' succeeded after {} attempt(s): {}",
                        conversation,
                        attempt,
                        preview(&raw_text, 80)
                    );
                    self.conversation_logger
                        .log(ConversationEvent::completion_response(
                            conversation,
                            attempt,
                            &raw_text,
                            response.usage,
                        ));
                    return Ok(InvocationOutcome {
                        raw_text,
                        usage: response.usage,
                        attempts: attempt,
                    });
                }
                Err(error) => error,
            };

            if let GatewayError::Configuration(message) = &error {
                warn!("Completion for '{}' is misconfigured: {}", conversation, message);
                self.conversation_logger
                    .log(ConversationEvent::completion_error(
                        conversation,
                        attempt,
                        &error.to_string(),
                    ));
                return Err(InvocationError::Configuration(message.clone()));
            }

            if error.is_retryable() && policy.allows_retry(attempt) {
                let delay = policy.delay_after(attempt);
                warn!(
                    "Completion attempt {} for '{}' failed ({}), retrying in {:?}",
                    attempt, conversation, error, delay
                );
                self.conversation_logger
                    .log(ConversationEvent::completion_retry(
                        conversation,
                        attempt,
                        delay.as_millis(),
                        &error.to_string(),
                    ));
                progress.on_retry(attempt, delay, &error);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                continue;
            }

            warn!(
                "Completion for '{}' failed after {} attempt(s): {}",
                conversation, attempt, error
            );
            self.conversation_logger
                .log(ConversationEvent::completion_error(
                    conversation,
                    attempt,
                    &error.to_string(),
                ));
            return Err(InvocationError::Permanent {
                attempts: attempt,
                source: error,
            });
        }
    }
}
