//! Configuration file loading for musing
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `MUSING_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./musing.toml` or `./.musing.toml`
//! 4. Global: `$XDG_CONFIG_HOME/musing/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileAnthropicConfig, FileBedrockConfig, FileChatConfig, FileConfig, FileLoggingConfig,
    FileModelConfig, FileOutputConfig, FileProvidersConfig, FileReplConfig, FileRetryConfig,
    FileRetryPolicyConfig, FileStorageConfig, ProviderKind, StorageBackend,
};
pub use loader::{ConfigError, ConfigLoader, ConfigSources, expand_home};
