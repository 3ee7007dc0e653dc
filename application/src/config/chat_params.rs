//! Chat parameters: static settings for the send pipeline.
//!
//! [`ChatParams`] groups what the send and archive use cases need beyond
//! the conversation itself: which model to call, how much history to send,
//! how to split reasoning, and the retry budgets.

use musing_domain::{ContextWindow, Model, NonTextTurnPolicy, ReasoningDelimiters};

use super::retry_policy::RetryPolicy;

/// Consecutive failed sends before degraded mode.
pub const DEFAULT_DEGRADED_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct ChatParams {
    pub model: Model,
    pub context_window: ContextWindow,
    pub non_text_turns: NonTextTurnPolicy,
    pub delimiters: ReasoningDelimiters,
    pub completion_retry: RetryPolicy,
    pub storage_retry: RetryPolicy,
    pub degraded_threshold: u32,
}

impl Default for ChatParams {
    fn default() -> Self {
        Self {
            model: Model::default(),
            context_window: ContextWindow::Full,
            non_text_turns: NonTextTurnPolicy::default(),
            delimiters: ReasoningDelimiters::default(),
            completion_retry: RetryPolicy::completion_default(),
            storage_retry: RetryPolicy::storage_default(),
            degraded_threshold: DEFAULT_DEGRADED_THRESHOLD,
        }
    }
}

impl ChatParams {
    // ==================== Builder Methods ====================

    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    pub fn with_context_window(mut self, window: ContextWindow) -> Self {
        self.context_window = window;
        self
    }

    pub fn with_non_text_turns(mut self, policy: NonTextTurnPolicy) -> Self {
        self.non_text_turns = policy;
        self
    }

    pub fn with_delimiters(mut self, delimiters: ReasoningDelimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    pub fn with_completion_retry(mut self, policy: RetryPolicy) -> Self {
        self.completion_retry = policy;
        self
    }

    pub fn with_storage_retry(mut self, policy: RetryPolicy) -> Self {
        self.storage_retry = policy;
        self
    }

    pub fn with_degraded_threshold(mut self, threshold: u32) -> Self {
        self.degraded_threshold = threshold.max(1);
        self
    }
}
