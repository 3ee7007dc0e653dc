//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Strings that name variants are kept as strings here and parsed by the
//! `parse_*` methods, which report problems as [`ConfigIssue`]s instead of
//! failing deserialization.

mod chat;
mod model;
mod output;
mod providers;
mod repl;
mod retry;
mod storage;

pub use chat::FileChatConfig;
pub use model::FileModelConfig;
pub use output::FileOutputConfig;
pub use providers::{FileAnthropicConfig, FileBedrockConfig, FileProvidersConfig, ProviderKind};
pub use repl::{FileLoggingConfig, FileReplConfig};
pub use retry::{FileRetryConfig, FileRetryPolicyConfig};
pub use storage::{FileStorageConfig, StorageBackend};

use musing_application::ChatParams;
use musing_domain::{ConfigIssue, ConversationDefaults};
use serde::{Deserialize, Serialize};

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Model selection
    pub model: FileModelConfig,
    /// Conversation defaults and pipeline settings
    pub chat: FileChatConfig,
    /// Retry budgets
    pub retry: FileRetryConfig,
    /// Conversation persistence
    pub storage: FileStorageConfig,
    /// Provider settings (credentials, region, endpoints)
    pub providers: FileProvidersConfig,
    /// Output settings
    pub output: FileOutputConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Transcript log settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();
        issues.extend(self.to_chat_params().1);
        issues.extend(self.conversation_defaults().1);
        issues.extend(self.chat.parse_reasoning_display().1);
        issues.extend(self.storage.parse_backend().1);
        issues.extend(self.providers.parse_default().1);
        issues
    }

    /// Pipeline parameters. Invalid values fall back to defaults and are
    /// reported.
    pub fn to_chat_params(&self) -> (ChatParams, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let (model, i) = self.model.parse_model();
        issues.extend(i);
        let (context_window, i) = self.chat.parse_context_window();
        issues.extend(i);
        let (non_text_turns, i) = self.chat.parse_non_text_turns();
        issues.extend(i);
        let (degraded_threshold, i) = self.chat.parse_degraded_threshold();
        issues.extend(i);
        let (completion_retry, i) = self.retry.completion_policy();
        issues.extend(i);
        let (storage_retry, i) = self.retry.storage_policy();
        issues.extend(i);

        let params = ChatParams::default()
            .with_model(model)
            .with_context_window(context_window)
            .with_non_text_turns(non_text_turns)
            .with_completion_retry(completion_retry)
            .with_storage_retry(storage_retry)
            .with_degraded_threshold(degraded_threshold);
        (params, issues)
    }

    pub fn conversation_defaults(&self) -> (ConversationDefaults, Vec<ConfigIssue>) {
        self.chat.to_defaults()
    }
}
