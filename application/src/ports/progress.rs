//! Progress notification port
//!
//! Defines the interface for reporting a blocking completion call while it
//! is outstanding.

use std::time::Duration;

use super::llm_gateway::GatewayError;

/// Callback for progress updates during a completion call
///
/// Implementations live in the presentation layer (a terminal spinner, for
/// instance). All methods default to no-ops.
pub trait ProgressNotifier: Send + Sync {
    /// Called once before the first attempt
    fn on_request_start(&self, _conversation: &str) {}

    /// Called when a retryable failure is about to be retried after `delay`
    fn on_retry(&self, _attempt: u32, _delay: Duration, _error: &GatewayError) {}

    /// Called once when the call has finished, successfully or not
    fn on_request_end(&self, _success: bool) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl ProgressNotifier for NoProgress {}
