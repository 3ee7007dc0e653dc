//! Waiting indicators for blocking completion calls

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use musing_application::ports::llm_gateway::GatewayError;
use musing_application::ports::progress::ProgressNotifier;
use std::sync::Mutex;
use std::time::Duration;

/// Spinner shown while a completion call is outstanding
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg} {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn with_spinner(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(spinner) = guard.as_ref() {
            f(spinner);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressNotifier for ProgressReporter {
    fn on_request_start(&self, conversation: &str) {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(Self::spinner_style());
        spinner.set_prefix(conversation.to_string());
        spinner.set_message("Waiting for Claude...");
        spinner.enable_steady_tick(Duration::from_millis(100));

        let mut guard = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = guard.replace(spinner) {
            previous.finish_and_clear();
        }
    }

    fn on_retry(&self, attempt: u32, delay: Duration, error: &GatewayError) {
        self.with_spinner(|spinner| {
            spinner.set_message(format!(
                "{} (attempt {} failed, retrying in {:.1}s)",
                error.to_string().yellow(),
                attempt,
                delay.as_secs_f64()
            ));
        });
    }

    fn on_request_end(&self, _success: bool) {
        let mut guard = self.spinner.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(spinner) = guard.take() {
            spinner.finish_and_clear();
        }
    }
}

/// Plain-text progress for non-interactive output
pub struct SimpleProgress;

impl ProgressNotifier for SimpleProgress {
    fn on_retry(&self, attempt: u32, delay: Duration, error: &GatewayError) {
        eprintln!(
            "{} attempt {} failed: {} (retrying in {:.1}s)",
            "->".yellow(),
            attempt,
            error,
            delay.as_secs_f64()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_lifecycle() {
        let reporter = ProgressReporter::new();
        reporter.on_request_start("Default");
        assert!(reporter.spinner.lock().unwrap().is_some());

        reporter.on_retry(1, Duration::from_secs(2), &GatewayError::Timeout);
        reporter.on_request_end(true);
        assert!(reporter.spinner.lock().unwrap().is_none());
    }

    #[test]
    fn test_end_without_start_is_harmless() {
        let reporter = ProgressReporter::new();
        reporter.on_request_end(false);
        reporter.on_retry(1, Duration::ZERO, &GatewayError::Timeout);
    }
}
