//! Port for structured conversation logging.
//!
//! Defines the [`ConversationLogger`] trait for recording transcript events
//! (completion requests, retries, responses, saves and loads) to a
//! structured log.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostics, while this port captures the transcript in a
//! machine-readable format (JSONL).

use musing_domain::Usage;
use serde_json::{Value, json};

/// A structured conversation event for logging.
///
/// Each event has a type string and a JSON payload containing
/// event-specific fields. The timestamp is added by the writer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationEvent {
    /// Event type identifier (e.g., "completion_request", "conversation_saved").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl ConversationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }

    pub fn completion_request(
        conversation: &str,
        model: &str,
        attempt: u32,
        blocks: usize,
    ) -> Self {
        Self::new(
            "completion_request",
            json!({
                "conversation": conversation,
                "model": model,
                "attempt": attempt,
                "blocks": blocks,
            }),
        )
    }

    pub fn completion_retry(conversation: &str, attempt: u32, delay_ms: u128, error: &str) -> Self {
        Self::new(
            "completion_retry",
            json!({
                "conversation": conversation,
                "attempt": attempt,
                "delay_ms": delay_ms,
                "error": error,
            }),
        )
    }

    pub fn completion_response(
        conversation: &str,
        attempts: u32,
        text: &str,
        usage: Option<Usage>,
    ) -> Self {
        let mut payload = json!({
            "conversation": conversation,
            "attempts": attempts,
            "bytes": text.len(),
            "text": text,
        });
        if let (Some(usage), Value::Object(map)) = (usage, &mut payload) {
            map.insert("input_tokens".into(), json!(usage.input_tokens));
            map.insert("output_tokens".into(), json!(usage.output_tokens));
        }
        Self::new("completion_response", payload)
    }

    pub fn completion_error(conversation: &str, attempts: u32, error: &str) -> Self {
        Self::new(
            "completion_error",
            json!({
                "conversation": conversation,
                "attempts": attempts,
                "error": error,
            }),
        )
    }

    pub fn conversation_saved(name: &str, backend: &str, turns: usize) -> Self {
        Self::new(
            "conversation_saved",
            json!({ "conversation": name, "backend": backend, "turns": turns }),
        )
    }

    pub fn conversation_loaded(name: &str, backend: &str, turns: usize) -> Self {
        Self::new(
            "conversation_loaded",
            json!({ "conversation": name, "backend": backend, "turns": turns }),
        )
    }
}

/// Port for logging conversation events to a structured log.
///
/// Implementations write each event as a single record (e.g., one JSONL line).
/// `log` is synchronous and infallible; write failures are dropped.
pub trait ConversationLogger: Send + Sync {
    /// Record a conversation event.
    fn log(&self, event: ConversationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoConversationLogger;

impl ConversationLogger for NoConversationLogger {
    fn log(&self, _event: ConversationEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_event_includes_usage_when_known() {
        let event = ConversationEvent::completion_response(
            "Default",
            1,
            "4",
            Some(Usage {
                input_tokens: 12,
                output_tokens: 3,
            }),
        );
        assert_eq!(event.event_type, "completion_response");
        assert_eq!(event.payload["input_tokens"], 12);
        assert_eq!(event.payload["output_tokens"], 3);
        assert_eq!(event.payload["text"], "4");
    }

    #[test]
    fn test_response_event_without_usage() {
        let event = ConversationEvent::completion_response("Default", 2, "ok", None);
        assert!(event.payload.get("input_tokens").is_none());
        assert_eq!(event.payload["attempts"], 2);
    }
}
