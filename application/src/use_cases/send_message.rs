//! Send Message use case.
//!
//! Runs the full chat pipeline for one user action:
//! append the user turn, build the payload, invoke the model, split the
//! reasoning block off the reply and append the assistant turn.
//!
//! Only one invocation may be outstanding per conversation; a second
//! attempt while one is in flight fails with [`ChatError::Busy`].
//! Consecutive failures trip degraded mode, which turns off automatic
//! retries until the user acknowledges it.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use musing_domain::{
    CompletionResult, Conversation, DomainError, Role, Turn, Usage, split_reasoning_with,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ChatParams, RetryPolicy};
use crate::ports::progress::ProgressNotifier;
use crate::use_cases::invoke_completion::{CompletionInvoker, InvocationError, build_request};

/// Errors from sending or regenerating a message.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Invocation(#[from] InvocationError),

    #[error("A request for '{conversation}' is already in flight")]
    Busy { conversation: String },
}

/// Conversations with an outstanding invocation.
#[derive(Debug, Default)]
pub struct InFlightRegistry {
    names: Mutex<HashSet<String>>,
}

impl InFlightRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Mark `conversation` as in flight. Returns `None` if it already is.
    pub fn try_acquire(self: &Arc<Self>, conversation: &str) -> Option<InFlightGuard> {
        let mut names = self.names.lock().unwrap_or_else(|e| e.into_inner());
        if !names.insert(conversation.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            registry: Arc::clone(self),
            conversation: conversation.to_string(),
        })
    }

    pub fn is_in_flight(&self, conversation: &str) -> bool {
        self.names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(conversation)
    }
}

/// Releases the in-flight mark when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    registry: Arc<InFlightRegistry>,
    conversation: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.registry
            .names
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.conversation);
    }
}

/// Counts consecutive failed sends and latches degraded mode.
#[derive(Debug)]
pub struct FailureTracker {
    consecutive: AtomicU32,
    degraded: AtomicBool,
    threshold: u32,
}

impl FailureTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            consecutive: AtomicU32::new(0),
            degraded: AtomicBool::new(false),
            threshold: threshold.max(1),
        }
    }

    /// Record a failure. Returns true if this failure tripped degraded mode.
    pub fn record_failure(&self) -> bool {
        let count = self.consecutive.fetch_add(1, Ordering::SeqCst) + 1;
        count >= self.threshold && !self.degraded.swap(true, Ordering::SeqCst)
    }

    pub fn record_success(&self) {
        self.consecutive.store(0, Ordering::SeqCst);
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive.load(Ordering::SeqCst)
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::SeqCst)
    }

    /// Leave degraded mode and start counting from zero.
    pub fn acknowledge(&self) {
        self.consecutive.store(0, Ordering::SeqCst);
        self.degraded.store(false, Ordering::SeqCst);
    }
}

/// Result of a successful send or regenerate.
#[derive(Debug, Clone, PartialEq)]
pub struct SendMessageOutput {
    pub result: CompletionResult,
    /// Index of the appended assistant turn.
    pub turn_index: usize,
    pub usage: Option<Usage>,
    pub attempts: u32,
}

/// Use case for sending a message and regenerating replies.
pub struct SendMessageUseCase {
    invoker: CompletionInvoker,
    params: ChatParams,
    in_flight: Arc<InFlightRegistry>,
    failures: FailureTracker,
}

impl SendMessageUseCase {
    pub fn new(invoker: CompletionInvoker, params: ChatParams) -> Self {
        let failures = FailureTracker::new(params.degraded_threshold);
        Self {
            invoker,
            params,
            in_flight: InFlightRegistry::new(),
            failures,
        }
    }

    pub fn params(&self) -> &ChatParams {
        &self.params
    }

    pub fn in_flight(&self) -> &Arc<InFlightRegistry> {
        &self.in_flight
    }

    pub fn is_degraded(&self) -> bool {
        self.failures.is_degraded()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.failures.consecutive_failures()
    }

    pub fn acknowledge_degraded(&self) {
        info!("Degraded mode acknowledged, automatic retries re-enabled");
        self.failures.acknowledge();
    }

    /// Append `prompt` as a user turn and ask the model for a reply.
    ///
    /// The user turn stays in the conversation even if the invocation fails.
    pub async fn send(
        &self,
        conversation: &mut Conversation,
        prompt: &str,
        progress: &dyn ProgressNotifier,
    ) -> Result<SendMessageOutput, ChatError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(DomainError::EmptyPrompt.into());
        }
        let _guard = self.acquire(conversation.name())?;

        conversation.append_turn(Turn::user(prompt));
        self.complete(conversation, progress).await
    }

    /// Drop everything after the user turn at `index` and ask again.
    pub async fn regenerate(
        &self,
        conversation: &mut Conversation,
        index: usize,
        progress: &dyn ProgressNotifier,
    ) -> Result<SendMessageOutput, ChatError> {
        if conversation.turn(index)?.role != Role::User {
            return Err(DomainError::NotAUserTurn(index).into());
        }
        let _guard = self.acquire(conversation.name())?;

        debug!(
            "Regenerating '{}' from turn {} ({} turns dropped)",
            conversation.name(),
            index,
            conversation.len() - index - 1
        );
        conversation.truncate_turns(index + 1);
        self.complete(conversation, progress).await
    }

    fn acquire(&self, conversation: &str) -> Result<InFlightGuard, ChatError> {
        self.in_flight
            .try_acquire(conversation)
            .ok_or_else(|| ChatError::Busy {
                conversation: conversation.to_string(),
            })
    }

    async fn complete(
        &self,
        conversation: &mut Conversation,
        progress: &dyn ProgressNotifier,
    ) -> Result<SendMessageOutput, ChatError> {
        let request = build_request(conversation, &self.params);
        let policy = if self.failures.is_degraded() {
            RetryPolicy::no_retry()
        } else {
            self.params.completion_retry
        };

        let outcome = match self
            .invoker
            .invoke(conversation.name(), &request, &policy, progress)
            .await
        {
            Ok(outcome) => outcome,
            Err(err) => {
                if self.failures.record_failure() {
                    warn!(
                        "{} consecutive failures, entering degraded mode (no automatic retries)",
                        self.failures.consecutive_failures()
                    );
                }
                return Err(err.into());
            }
        };
        self.failures.record_success();

        let result = split_reasoning_with(&outcome.raw_text, &self.params.delimiters);
        conversation.append_turn(Turn::assistant(
            result.visible_text.clone(),
            result.reasoning().map(str::to_string),
        ));

        Ok(SendMessageOutput {
            result,
            turn_index: conversation.len() - 1,
            usage: outcome.usage,
            attempts: outcome.attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::{CompletionResponse, GatewayError};
    use crate::ports::progress::NoProgress;
    use crate::use_cases::invoke_completion::tests::ScriptedGateway;
    use musing_domain::prompt::payload::REASONING_INSTRUCTION;

    fn params() -> ChatParams {
        ChatParams::default().with_completion_retry(RetryPolicy::immediate(2))
    }

    fn use_case(gateway: Arc<ScriptedGateway>) -> SendMessageUseCase {
        SendMessageUseCase::new(CompletionInvoker::new(gateway), params())
    }

    #[tokio::test]
    async fn test_send_splits_reasoning_into_turn() {
        let gateway = Arc::new(ScriptedGateway::echo("<thinking>add the numbers</thinking>4"));
        let use_case = use_case(gateway.clone());
        let mut conversation = Conversation::new("Default").unwrap();
        conversation.set_force_reasoning(true);

        let output = use_case
            .send(&mut conversation, "2+2?", &NoProgress)
            .await
            .unwrap();

        assert_eq!(output.result.visible_text, "4");
        assert_eq!(output.turn_index, 1);
        let reply = conversation.turn(1).unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.text, "4");
        assert_eq!(reply.reasoning.as_deref(), Some("add the numbers"));

        let requests = gateway.requests.lock().unwrap();
        assert_eq!(requests[0].blocks[0].text, REASONING_INSTRUCTION);
        assert_eq!(requests[0].blocks.last().unwrap().text, "2+2?");
    }

    #[tokio::test]
    async fn test_reply_without_reasoning_stores_none() {
        let gateway = Arc::new(ScriptedGateway::echo("  plain answer  "));
        let use_case = use_case(gateway);
        let mut conversation = Conversation::new("Default").unwrap();

        use_case
            .send(&mut conversation, "hi", &NoProgress)
            .await
            .unwrap();

        let reply = conversation.turn(1).unwrap();
        assert_eq!(reply.text, "plain answer");
        assert_eq!(reply.reasoning, None);
    }

    #[tokio::test]
    async fn test_empty_prompt_is_rejected() {
        let gateway = Arc::new(ScriptedGateway::echo("unused"));
        let use_case = use_case(gateway.clone());
        let mut conversation = Conversation::new("Default").unwrap();

        let err = use_case
            .send(&mut conversation, "   ", &NoProgress)
            .await
            .unwrap_err();

        assert_eq!(err, ChatError::Domain(DomainError::EmptyPrompt));
        assert!(conversation.is_empty());
        assert_eq!(gateway.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_send_keeps_user_turn() {
        let gateway = Arc::new(ScriptedGateway::always(GatewayError::InvalidRequest(
            "bad".into(),
        )));
        let use_case = use_case(gateway);
        let mut conversation = Conversation::new("Default").unwrap();

        let err = use_case
            .send(&mut conversation, "hello", &NoProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, ChatError::Invocation(_)));
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.turn(0).unwrap().role, Role::User);
        assert!(!use_case.in_flight().is_in_flight("Default"));
    }

    #[tokio::test]
    async fn test_busy_conversation_is_rejected() {
        let gateway = Arc::new(ScriptedGateway::echo("unused"));
        let use_case = use_case(gateway.clone());
        let mut conversation = Conversation::new("Default").unwrap();

        let _held = use_case.in_flight().try_acquire("Default").unwrap();
        let err = use_case
            .send(&mut conversation, "hello", &NoProgress)
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ChatError::Busy {
                conversation: "Default".into()
            }
        );
        assert!(conversation.is_empty());
        assert_eq!(gateway.calls(), 0);
    }

    #[test]
    fn test_in_flight_guard_releases_on_drop() {
        let registry = InFlightRegistry::new();
        let guard = registry.try_acquire("a").unwrap();
        assert!(registry.try_acquire("a").is_none());
        assert!(registry.try_acquire("b").is_some());
        drop(guard);
        assert!(registry.try_acquire("a").is_some());
    }

    #[tokio::test]
    async fn test_degraded_mode_disables_retries_until_acknowledged() {
        let gateway = Arc::new(ScriptedGateway::always(GatewayError::Throttled(
            "slow down".into(),
        )));
        let use_case = use_case(gateway.clone());
        let mut conversation = Conversation::new("Default").unwrap();

        for _ in 0..3 {
            let _ = use_case.send(&mut conversation, "ping", &NoProgress).await;
        }
        assert!(use_case.is_degraded());
        assert_eq!(gateway.calls(), 6);

        // single attempt while degraded
        let _ = use_case.send(&mut conversation, "ping", &NoProgress).await;
        assert_eq!(gateway.calls(), 7);

        use_case.acknowledge_degraded();
        assert!(!use_case.is_degraded());
        let _ = use_case.send(&mut conversation, "ping", &NoProgress).await;
        assert_eq!(gateway.calls(), 9);
    }

    #[tokio::test]
    async fn test_success_resets_failure_count() {
        let gateway = Arc::new(ScriptedGateway::new(vec![
            Err(GatewayError::Unauthorized("x".into())),
            Err(GatewayError::Unauthorized("x".into())),
            Ok(CompletionResponse::from_text("ok")),
        ]));
        let use_case = use_case(gateway);
        let mut conversation = Conversation::new("Default").unwrap();

        for _ in 0..3 {
            let _ = use_case.send(&mut conversation, "ping", &NoProgress).await;
        }

        assert_eq!(use_case.consecutive_failures(), 0);
        assert!(!use_case.is_degraded());
    }

    #[tokio::test]
    async fn test_regenerate_truncates_after_user_turn() {
        let gateway = Arc::new(ScriptedGateway::echo("<thinking>again</thinking>second"));
        let use_case = use_case(gateway);
        let mut conversation = Conversation::new("Default").unwrap();
        conversation.append_turn(Turn::user("q1"));
        conversation.append_turn(Turn::assistant("a1", None));
        conversation.append_turn(Turn::user("q2"));
        conversation.append_turn(Turn::assistant("a2", None));

        let output = use_case
            .regenerate(&mut conversation, 0, &NoProgress)
            .await
            .unwrap();

        assert_eq!(output.turn_index, 1);
        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.turn(1).unwrap().text, "second");
        assert_eq!(conversation.turn(1).unwrap().reasoning.as_deref(), Some("again"));
    }

    #[tokio::test]
    async fn test_regenerate_requires_user_turn() {
        let gateway = Arc::new(ScriptedGateway::echo("unused"));
        let use_case = use_case(gateway);
        let mut conversation = Conversation::new("Default").unwrap();
        conversation.append_turn(Turn::user("q1"));
        conversation.append_turn(Turn::assistant("a1", None));

        let err = use_case
            .regenerate(&mut conversation, 1, &NoProgress)
            .await
            .unwrap_err();
        assert_eq!(err, ChatError::Domain(DomainError::NotAUserTurn(1)));

        let err = use_case
            .regenerate(&mut conversation, 5, &NoProgress)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ChatError::Domain(DomainError::IndexOutOfRange { index: 5, len: 2 })
        ));
        assert_eq!(conversation.len(), 2);
    }
}
