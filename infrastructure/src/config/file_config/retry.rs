//! Retry configuration from TOML (`[retry.completion]`, `[retry.storage]`)

use std::time::Duration;

use musing_application::RetryPolicy;
use musing_domain::{ConfigIssue, ConfigIssueCode};
use serde::{Deserialize, Serialize};

/// One retry budget. Unset fields keep the section's built-in schedule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryPolicyConfig {
    pub max_attempts: Option<u32>,
    pub multiplier_secs: Option<u64>,
    pub min_delay_secs: Option<u64>,
    pub max_delay_secs: Option<u64>,
}

impl FileRetryPolicyConfig {
    /// Overlay the configured fields on `base`, reporting issues against
    /// `[retry.<section>]`.
    pub fn to_policy(&self, section: &str, base: RetryPolicy) -> (RetryPolicy, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let max_attempts = self.max_attempts.unwrap_or(base.max_attempts);
        if max_attempts == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: format!("retry.{section}.max_attempts"),
                },
                format!("retry.{section}.max_attempts: must be at least 1"),
            ));
        }

        let multiplier = self
            .multiplier_secs
            .map_or(base.multiplier, Duration::from_secs);
        let min_delay = self
            .min_delay_secs
            .map_or(base.min_delay, Duration::from_secs);
        let max_delay = self
            .max_delay_secs
            .map_or(base.max_delay, Duration::from_secs);
        if min_delay > max_delay {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::OutOfRange {
                    field: format!("retry.{section}.min_delay_secs"),
                },
                format!(
                    "retry.{section}: min_delay_secs ({}) is greater than max_delay_secs ({})",
                    min_delay.as_secs(),
                    max_delay.as_secs()
                ),
            ));
        }

        let policy = RetryPolicy::new(max_attempts, multiplier, min_delay, max_delay);
        (policy, issues)
    }
}

/// Raw retry configuration from TOML
///
/// # Example
///
/// ```toml
/// [retry.completion]
/// max_attempts = 2
/// multiplier_secs = 1
/// min_delay_secs = 2
/// max_delay_secs = 6
///
/// [retry.storage]
/// max_attempts = 3
/// min_delay_secs = 4
/// max_delay_secs = 10
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    pub completion: FileRetryPolicyConfig,
    pub storage: FileRetryPolicyConfig,
}

impl FileRetryConfig {
    pub fn completion_policy(&self) -> (RetryPolicy, Vec<ConfigIssue>) {
        self.completion
            .to_policy("completion", RetryPolicy::completion_default())
    }

    pub fn storage_policy(&self) -> (RetryPolicy, Vec<ConfigIssue>) {
        self.storage
            .to_policy("storage", RetryPolicy::storage_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_builtin_schedules() {
        let config = FileRetryConfig::default();
        assert_eq!(
            config.completion_policy().0,
            RetryPolicy::completion_default()
        );
        assert_eq!(config.storage_policy().0, RetryPolicy::storage_default());
    }

    #[test]
    fn test_invalid_budget_reported() {
        let config = FileRetryPolicyConfig {
            max_attempts: Some(0),
            multiplier_secs: Some(1),
            min_delay_secs: Some(9),
            max_delay_secs: Some(3),
        };
        let (policy, issues) = config.to_policy("completion", RetryPolicy::completion_default());
        assert_eq!(issues.len(), 2);
        assert_eq!(policy.max_attempts, 1);
        assert!(issues[1].message.contains("retry.completion"));
    }

    #[test]
    fn test_partial_section_keeps_section_schedule() {
        let config: FileRetryConfig = toml::from_str(
            r#"
[storage]
max_attempts = 5
"#,
        )
        .unwrap();
        let (policy, issues) = config.storage_policy();
        assert!(issues.is_empty());
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.min_delay, Duration::from_secs(4));
        assert_eq!(policy.max_delay, Duration::from_secs(10));
    }
}
