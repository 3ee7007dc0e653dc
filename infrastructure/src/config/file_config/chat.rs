//! Chat configuration from TOML (`[chat]` section)

use musing_application::config::DEFAULT_DEGRADED_THRESHOLD;
use musing_domain::{
    ConfigIssue, ConfigIssueCode, ContextWindow, ConversationDefaults, DEFAULT_SYSTEM_PROMPT,
    NonTextTurnPolicy, ReasoningDisplay, SamplingSettings,
};
use serde::{Deserialize, Serialize};

/// Largest history window that does not draw a warning.
const CONTEXT_WINDOW_WARN_LIMIT: usize = 1000;

/// Raw chat configuration from TOML
///
/// # Example
///
/// ```toml
/// [chat]
/// system_prompt = "You are Claude. Provide chain-of-thought if forced."
/// force_reasoning = false
/// temperature = 0.7
/// max_tokens = 1000
/// context_window = 0                 # 0 = full history
/// show_reasoning = true
/// reasoning_display = "when_present" # or "when_non_empty"
/// non_text_turns = "skip"            # or "stringify"
/// degraded_threshold = 3
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChatConfig {
    pub system_prompt: String,
    pub force_reasoning: bool,
    pub temperature: f64,
    pub max_tokens: u32,
    pub context_window: usize,
    pub show_reasoning: bool,
    pub reasoning_display: String,
    pub non_text_turns: String,
    pub degraded_threshold: u32,
}

impl Default for FileChatConfig {
    fn default() -> Self {
        let sampling = SamplingSettings::default();
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            force_reasoning: false,
            temperature: sampling.temperature,
            max_tokens: sampling.max_output_tokens,
            context_window: 0,
            show_reasoning: true,
            reasoning_display: "when_present".to_string(),
            non_text_turns: "skip".to_string(),
            degraded_threshold: DEFAULT_DEGRADED_THRESHOLD,
        }
    }
}

impl FileChatConfig {
    /// Settings for newly created conversations.
    ///
    /// Out-of-range sampling values are reported and replaced by defaults.
    pub fn to_defaults(&self) -> (ConversationDefaults, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let fallback = SamplingSettings::default();

        let temperature = if (0.0..=1.0).contains(&self.temperature) {
            self.temperature
        } else {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "chat.temperature".to_string(),
                },
                format!(
                    "chat.temperature: {} is outside [0, 1]",
                    self.temperature
                ),
            ));
            fallback.temperature
        };

        let max_output_tokens = if self.max_tokens > 0 {
            self.max_tokens
        } else {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "chat.max_tokens".to_string(),
                },
                "chat.max_tokens: must be greater than 0",
            ));
            fallback.max_output_tokens
        };

        let defaults = ConversationDefaults {
            system_prompt: self.system_prompt.trim().to_string(),
            force_reasoning: self.force_reasoning,
            sampling: SamplingSettings {
                temperature,
                max_output_tokens,
            },
        };
        (defaults, issues)
    }

    pub fn parse_context_window(&self) -> (ContextWindow, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        if self.context_window > CONTEXT_WINDOW_WARN_LIMIT {
            issues.push(ConfigIssue::warning(
                ConfigIssueCode::OutOfRange {
                    field: "chat.context_window".to_string(),
                },
                format!(
                    "chat.context_window: {} turns is unusually large; requests may exceed the model's context",
                    self.context_window
                ),
            ));
        }
        (ContextWindow::from_turn_limit(self.context_window), issues)
    }

    pub fn parse_reasoning_display(&self) -> (ReasoningDisplay, Vec<ConfigIssue>) {
        match self.reasoning_display.trim().to_lowercase().as_str() {
            "when_present" | "present" => (ReasoningDisplay::WhenPresent, vec![]),
            "when_non_empty" | "non_empty" => (ReasoningDisplay::WhenNonEmpty, vec![]),
            _ => (
                ReasoningDisplay::default(),
                vec![invalid_enum(
                    "chat.reasoning_display",
                    &self.reasoning_display,
                    &["when_present", "when_non_empty"],
                )],
            ),
        }
    }

    pub fn parse_non_text_turns(&self) -> (NonTextTurnPolicy, Vec<ConfigIssue>) {
        match self.non_text_turns.trim().to_lowercase().as_str() {
            "skip" => (NonTextTurnPolicy::Skip, vec![]),
            "stringify" => (NonTextTurnPolicy::Stringify, vec![]),
            _ => (
                NonTextTurnPolicy::default(),
                vec![invalid_enum(
                    "chat.non_text_turns",
                    &self.non_text_turns,
                    &["skip", "stringify"],
                )],
            ),
        }
    }

    pub fn parse_degraded_threshold(&self) -> (u32, Vec<ConfigIssue>) {
        if self.degraded_threshold == 0 {
            let issue = ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: "chat.degraded_threshold".to_string(),
                },
                "chat.degraded_threshold: must be at least 1",
            );
            return (DEFAULT_DEGRADED_THRESHOLD, vec![issue]);
        }
        (self.degraded_threshold, vec![])
    }
}

/// Issue for a string that names no known variant.
pub(super) fn invalid_enum(field: &str, value: &str, valid: &[&str]) -> ConfigIssue {
    ConfigIssue::error(
        ConfigIssueCode::InvalidEnumValue {
            field: field.to_string(),
            value: value.to_string(),
            valid_values: valid.iter().map(|v| v.to_string()).collect(),
        },
        format!(
            "{}: unknown value '{}' (expected one of: {})",
            field,
            value,
            valid.join(", ")
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_conversation_defaults() {
        let (defaults, issues) = FileChatConfig::default().to_defaults();
        assert!(issues.is_empty());
        assert_eq!(defaults, ConversationDefaults::default());
    }

    #[test]
    fn test_out_of_range_sampling_reported() {
        let config = FileChatConfig {
            temperature: 1.5,
            max_tokens: 0,
            ..FileChatConfig::default()
        };
        let (defaults, issues) = config.to_defaults();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(ConfigIssue::is_error));
        assert_eq!(defaults.sampling, SamplingSettings::default());
    }

    #[test]
    fn test_context_window_zero_is_full() {
        let (window, issues) = FileChatConfig::default().parse_context_window();
        assert_eq!(window, ContextWindow::Full);
        assert!(issues.is_empty());

        let config = FileChatConfig {
            context_window: 5000,
            ..FileChatConfig::default()
        };
        let (window, issues) = config.parse_context_window();
        assert_eq!(window, ContextWindow::Recent(5000));
        assert_eq!(issues.len(), 1);
        assert!(!issues[0].is_error());
    }

    #[test]
    fn test_enum_fields() {
        let config = FileChatConfig {
            reasoning_display: "when_non_empty".to_string(),
            non_text_turns: "bogus".to_string(),
            ..FileChatConfig::default()
        };
        assert_eq!(
            config.parse_reasoning_display().0,
            ReasoningDisplay::WhenNonEmpty
        );
        let (policy, issues) = config.parse_non_text_turns();
        assert_eq!(policy, NonTextTurnPolicy::Skip);
        assert!(matches!(
            issues[0].code,
            ConfigIssueCode::InvalidEnumValue { .. }
        ));
    }
}
